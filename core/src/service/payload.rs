use crate::media::MediaFile;
use crate::prelude::{CompareError, CompareResult, GENERIC_SERVER_FAILURE};
use crate::service::model::EmbeddingModel;
use serde::{Deserialize, Serialize};

/// Similarity at or above which a match is considered verified when the
/// client decides on its own.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 65.0;

/// Everything sent to the comparison service in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub first: MediaFile,
    pub second: MediaFile,
    pub model: EmbeddingModel,
}

/// Successful outcome of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub distance: f64,
    /// Percentage in `0.0..=100.0`.
    pub similarity: f64,
    pub model_used: String,
    pub verified: bool,
}

/// Who decides whether a pair is a verified match.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VerificationPolicy {
    /// Trust the `verified` flag in the response; it must be present.
    #[default]
    ServerReported,
    /// Verified when similarity meets the threshold; the server flag is ignored.
    Threshold { percent: f64 },
}

impl VerificationPolicy {
    fn decide(&self, similarity: f64, reported: Option<bool>) -> CompareResult<bool> {
        match self {
            VerificationPolicy::ServerReported => reported.ok_or_else(|| {
                CompareError::MalformedResponse("response is missing `verified`".into())
            }),
            VerificationPolicy::Threshold { percent } => Ok(similarity >= *percent),
        }
    }
}

/// `similarity` arrives either as a number or as text such as `"77.5%"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSimilarity {
    Number(f64),
    Text(String),
}

impl WireSimilarity {
    fn percent(&self) -> Option<f64> {
        match self {
            WireSimilarity::Number(value) => Some(*value),
            WireSimilarity::Text(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    distance: Option<f64>,
    similarity: Option<WireSimilarity>,
    model_used: Option<String>,
    verified: Option<bool>,
    error: Option<String>,
}

/// Maps a raw HTTP answer onto the comparison outcome.
pub fn interpret_response(
    status: u16,
    body: &[u8],
    requested: EmbeddingModel,
    policy: &VerificationPolicy,
) -> CompareResult<ComparisonResult> {
    let parsed = serde_json::from_slice::<WireResponse>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|wire| wire.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| GENERIC_SERVER_FAILURE.to_string());
        return Err(CompareError::Server(message));
    }

    let wire = parsed.map_err(|e| CompareError::MalformedResponse(e.to_string()))?;
    let distance = wire
        .distance
        .ok_or_else(|| CompareError::MalformedResponse("response is missing `distance`".into()))?;
    let similarity = wire
        .similarity
        .as_ref()
        .and_then(WireSimilarity::percent)
        .ok_or_else(|| {
            CompareError::MalformedResponse("response has no numeric `similarity`".into())
        })?;
    let verified = policy.decide(similarity, wire.verified)?;

    Ok(ComparisonResult {
        distance,
        similarity,
        model_used: wire
            .model_used
            .unwrap_or_else(|| requested.as_str().to_string()),
        verified,
    })
}
