pub mod capture;
pub mod file;
pub mod preview;

pub use capture::{CaptureError, CapturedFrame, CommandCamera, FrameSource};
pub use file::MediaFile;
pub use preview::{PreviewHandle, PreviewLedger};
