use crate::media::{MediaFile, PreviewHandle};
use crate::prelude::AcquisitionMode;

/// A populated image input: the bytes, how they were obtained, and the
/// preview handle that keeps them on screen.
#[derive(Debug)]
pub struct ImageSlot {
    media: MediaFile,
    acquired_by: AcquisitionMode,
    preview: PreviewHandle,
}

impl ImageSlot {
    pub(crate) fn new(media: MediaFile, acquired_by: AcquisitionMode, preview: PreviewHandle) -> Self {
        Self {
            media,
            acquired_by,
            preview,
        }
    }

    pub fn media(&self) -> &MediaFile {
        &self.media
    }

    pub fn acquired_by(&self) -> AcquisitionMode {
        self.acquired_by
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// One input position of the workflow: the affordance currently shown and
/// whatever image it holds.
#[derive(Debug, Default)]
pub(crate) struct SlotInput {
    pub(crate) shown_mode: AcquisitionMode,
    pub(crate) image: Option<ImageSlot>,
}
