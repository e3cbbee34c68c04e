pub mod client;
pub mod model;
pub mod payload;

pub use client::{CompareClient, HttpCompareClient};
pub use model::{EmbeddingModel, UnknownModel};
pub use payload::{
    interpret_response, ComparisonRequest, ComparisonResult, VerificationPolicy,
    DEFAULT_THRESHOLD_PERCENT,
};
