use crate::media::file::MediaFile;
use crate::prelude::SlotId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(#[source] std::io::Error),
    #[error("camera exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("camera produced an empty frame")]
    EmptyFrame,
}

/// A still JPEG sampled from a live video source.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub jpeg: Vec<u8>,
}

impl CapturedFrame {
    /// Turns the snapshot into an upload-equivalent file named after the slot.
    pub fn into_media(self, slot: SlotId) -> MediaFile {
        MediaFile::new(
            format!("{}.jpg", slot.label()),
            Some("image/jpeg".to_string()),
            self.jpeg,
        )
    }
}

/// Something that can be sampled into a single still frame on demand.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError>;
}

/// Camera driven by an external grabber that writes one JPEG to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandCamera {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandCamera {
    fn default() -> Self {
        let args = [
            "-loglevel", "error", "-f", "v4l2", "-i", "/dev/video0", "-frames:v", "1", "-f",
            "image2pipe", "-vcodec", "mjpeg", "-",
        ];
        Self {
            program: "ffmpeg".into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

#[async_trait]
impl FrameSource for CommandCamera {
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        log::info!("capturing frame via {}", self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(CaptureError::Unavailable)?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }

        Ok(CapturedFrame {
            jpeg: output.stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_frame_becomes_named_jpeg() {
        let media = CapturedFrame { jpeg: vec![0xFF, 0xD8, 0xFF] }.into_media(SlotId::First);
        assert_eq!(media.file_name(), "First Image.jpg");
        assert_eq!(media.media_type(), Some("image/jpeg"));
        assert!(media.is_image());
    }

    #[tokio::test]
    async fn missing_program_reports_unavailable() {
        let camera = CommandCamera {
            program: "definitely-not-a-camera-binary".into(),
            args: Vec::new(),
        };
        let err = camera.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_stdout_is_rejected() {
        let camera = CommandCamera {
            program: "true".into(),
            args: Vec::new(),
        };
        let err = camera.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::EmptyFrame));
    }
}
