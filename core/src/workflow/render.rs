use crate::service::{ComparisonResult, DEFAULT_THRESHOLD_PERCENT};
use crate::workflow::state::WorkflowState;

/// What the result area shows for a given state.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Hidden,
    Busy,
    Success(ResultSummary),
    Failure(String),
}

impl ResultView {
    pub fn of(state: &WorkflowState) -> Self {
        match state {
            WorkflowState::Idle => ResultView::Hidden,
            WorkflowState::Submitting => ResultView::Busy,
            WorkflowState::Succeeded(result) => ResultView::Success(ResultSummary::from(result)),
            WorkflowState::Failed(err) => ResultView::Failure(err.to_string()),
        }
    }
}

/// Display-ready fields of a successful comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub distance: f64,
    pub similarity: f64,
    pub model_used: String,
    pub verified: bool,
}

impl From<&ComparisonResult> for ResultSummary {
    fn from(result: &ComparisonResult) -> Self {
        Self {
            distance: result.distance,
            similarity: result.similarity,
            model_used: result.model_used.clone(),
            verified: result.verified,
        }
    }
}

impl ResultSummary {
    pub fn distance_text(&self) -> String {
        format!("{:.4}", self.distance)
    }

    pub fn similarity_text(&self) -> String {
        format!("{:.2}%", self.similarity)
    }

    pub fn similarity_label(&self) -> String {
        format!("Similarity: {}", self.similarity_text())
    }

    pub fn verdict(&self) -> &'static str {
        if self.verified {
            "Verified Match"
        } else {
            "No Match"
        }
    }

    /// Colour hint only; verification itself follows the configured policy.
    pub fn similarity_is_high(&self) -> bool {
        self.similarity >= DEFAULT_THRESHOLD_PERCENT
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Distance: {}", self.distance_text()),
            self.similarity_label(),
            format!("Model Used: {}", self.model_used),
            format!("Verification: {}", self.verdict()),
        ]
    }
}
