use image::ImageFormat;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Raw image bytes together with the name and media type they arrived with.
///
/// The bytes are shared, so cloning a `MediaFile` into a request or a preview
/// does not copy the image.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    file_name: String,
    media_type: Option<String>,
    bytes: Arc<[u8]>,
}

impl MediaFile {
    /// Builds a file with an explicitly declared media type.
    pub fn new(file_name: impl Into<String>, media_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type,
            bytes: bytes.into(),
        }
    }

    /// Builds a file whose media type is detected from its content, falling
    /// back to the file extension.
    pub fn sniffed(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let media_type = detect_media_type(&file_name, &bytes);
        Self::new(file_name, media_type, bytes)
    }

    /// Reads a file from disk and sniffs its media type.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::sniffed(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// An accepted image has a media type in the `image/` family.
    pub fn is_image(&self) -> bool {
        self.media_type
            .as_deref()
            .map(|mime| mime.starts_with("image/"))
            .unwrap_or(false)
    }
}

fn detect_media_type(file_name: &str, bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(file_name))
        .ok()
        .map(|format| format.to_mime_type().to_string())
}
