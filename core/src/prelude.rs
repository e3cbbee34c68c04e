use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown when the service answers with a failure but no `error` field.
pub const GENERIC_SERVER_FAILURE: &str = "Error comparing";

/// Identifies one of the two image inputs of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    First,
    Second,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::First, SlotId::Second];

    pub fn label(self) -> &'static str {
        match self {
            SlotId::First => "First Image",
            SlotId::Second => "Second Image",
        }
    }

    /// Multipart field name used on the wire.
    pub fn field_name(self) -> &'static str {
        match self {
            SlotId::First => "img1",
            SlotId::Second => "img2",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SlotId::First => 0,
            SlotId::Second => 1,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an image reaches a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    #[default]
    Upload,
    Camera,
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionMode::Upload => f.write_str("Upload"),
            AcquisitionMode::Camera => f.write_str("Camera"),
        }
    }
}

/// Every way a comparison can fail. None of these is fatal: the workflow stays
/// usable and a new submission may follow immediately.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Select a valid image")]
    InvalidMediaType {
        file_name: String,
        media_type: Option<String>,
    },
    #[error("Please provide both images.")]
    MissingInput,
    #[error("A comparison is already in progress.")]
    Busy,
    /// Server-provided message, shown verbatim.
    #[error("{0}")]
    Server(String),
    #[error("Server error or network issue")]
    Network(String),
    #[error("Unexpected response from comparison service")]
    MalformedResponse(String),
}

pub type CompareResult<T> = Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_displays_message_verbatim() {
        let err = CompareError::Server("model load failed".into());
        assert_eq!(err.to_string(), "model load failed");
    }

    #[test]
    fn network_error_hides_transport_detail() {
        let err = CompareError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Server error or network issue");
        assert_ne!(
            err.to_string(),
            CompareError::Server(GENERIC_SERVER_FAILURE.into()).to_string()
        );
    }

    #[test]
    fn slot_field_names_follow_wire_contract() {
        assert_eq!(SlotId::First.field_name(), "img1");
        assert_eq!(SlotId::Second.field_name(), "img2");
        assert_eq!(SlotId::Second.to_string(), "Second Image");
    }
}
