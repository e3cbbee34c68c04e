use crate::prelude::CompareError;
use crate::service::ComparisonResult;

/// Lifecycle of the current comparison.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Submitting,
    Succeeded(ComparisonResult),
    Failed(CompareError),
}

impl WorkflowState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, WorkflowState::Submitting)
    }

    pub fn result(&self) -> Option<&ComparisonResult> {
        match self {
            WorkflowState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CompareError> {
        match self {
            WorkflowState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Binds a completion to the submission that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(pub(crate) u64);
