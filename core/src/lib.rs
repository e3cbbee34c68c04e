//! Core of the CerminRupa face-similarity frontend.
//!
//! Holds the two-slot compare workflow, the media it accepts (uploads and
//! camera snapshots), the preview handles that keep images on screen, and the
//! multipart client for the external comparison service. Face analysis itself
//! happens on that service.

pub mod media;
pub mod prelude;
pub mod service;
pub mod settings;
pub mod telemetry;
pub mod workflow;

pub use prelude::{AcquisitionMode, CompareError, CompareResult, SlotId};
pub use service::{CompareClient, ComparisonResult, EmbeddingModel, HttpCompareClient};
pub use settings::Settings;
pub use workflow::{CompareWorkflow, ResultView, WorkflowState};
