pub mod compare;
pub mod render;
pub mod slot;
pub mod state;

pub use compare::{CompareWorkflow, Submission};
pub use render::{ResultSummary, ResultView};
pub use slot::ImageSlot;
pub use state::{Ticket, WorkflowState};
