use crate::media::{CapturedFrame, MediaFile, PreviewLedger};
use crate::prelude::{AcquisitionMode, CompareError, CompareResult, SlotId};
use crate::service::{CompareClient, ComparisonRequest, ComparisonResult, EmbeddingModel};
use crate::telemetry::{ActivityLog, SubmissionMetrics};
use crate::workflow::slot::{ImageSlot, SlotInput};
use crate::workflow::state::{Ticket, WorkflowState};

/// A request ready to be sent, tagged with the ticket its completion must
/// present to [`CompareWorkflow::finish`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: ComparisonRequest,
}

/// Two image slots, the selected model, and the lifecycle of the comparison
/// built from them.
///
/// All transitions go through `&mut self`, so the owner (an event handler or
/// a CLI driver) is the single writer. Network work happens outside: callers
/// take a [`Submission`] from [`begin_submission`](Self::begin_submission),
/// run it, and report back through [`finish`](Self::finish).
#[derive(Debug)]
pub struct CompareWorkflow {
    slots: [SlotInput; 2],
    model: EmbeddingModel,
    state: WorkflowState,
    generation: u64,
    in_flight: Option<Ticket>,
    ledger: PreviewLedger,
    activity: ActivityLog,
    metrics: SubmissionMetrics,
}

impl CompareWorkflow {
    pub fn new(model: EmbeddingModel) -> Self {
        Self::with_ledger(model, PreviewLedger::new())
    }

    pub fn with_ledger(model: EmbeddingModel, ledger: PreviewLedger) -> Self {
        Self {
            slots: Default::default(),
            model,
            state: WorkflowState::Idle,
            generation: 0,
            in_flight: None,
            ledger,
            activity: ActivityLog::new(),
            metrics: SubmissionMetrics::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn model(&self) -> EmbeddingModel {
        self.model
    }

    pub fn set_model(&mut self, model: EmbeddingModel) {
        if self.model != model {
            self.model = model;
            self.activity.record(format!("Model set to {}", model));
        }
    }

    pub fn slot(&self, slot: SlotId) -> Option<&ImageSlot> {
        self.slots[slot.index()].image.as_ref()
    }

    /// Input affordance currently shown for `slot`.
    pub fn mode(&self, slot: SlotId) -> AcquisitionMode {
        self.slots[slot.index()].shown_mode
    }

    /// Switches the shown affordance; a stored image is kept.
    pub fn set_mode(&mut self, slot: SlotId, mode: AcquisitionMode) {
        self.slots[slot.index()].shown_mode = mode;
    }

    pub fn ledger(&self) -> &PreviewLedger {
        &self.ledger
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn metrics(&self) -> &SubmissionMetrics {
        &self.metrics
    }

    /// Stores an image picked from disk or dropped onto the slot.
    pub fn select_file(&mut self, slot: SlotId, media: MediaFile) -> CompareResult<()> {
        self.populate(slot, media, AcquisitionMode::Upload)
    }

    /// Stores a camera snapshot; from here on it is handled like an upload.
    pub fn accept_capture(&mut self, slot: SlotId, frame: CapturedFrame) -> CompareResult<()> {
        self.populate(slot, frame.into_media(slot), AcquisitionMode::Camera)
    }

    /// Replaces the slot's image and clears any result or error.
    ///
    /// Non-images are refused without touching the slot or the state.
    pub fn populate(
        &mut self,
        slot: SlotId,
        media: MediaFile,
        acquired_by: AcquisitionMode,
    ) -> CompareResult<()> {
        if !media.is_image() {
            self.activity.record(format!(
                "Rejected {} for {}: not an image",
                media.file_name(),
                slot
            ));
            return Err(CompareError::InvalidMediaType {
                file_name: media.file_name().to_string(),
                media_type: media.media_type().map(str::to_string),
            });
        }

        let preview = self.ledger.acquire(&media);
        self.activity.record(format!(
            "{} set from {} ({} bytes)",
            slot,
            media.file_name(),
            media.len()
        ));
        // The previous ImageSlot is dropped here, releasing its preview.
        self.slots[slot.index()].image = Some(ImageSlot::new(media, acquired_by, preview));
        if self.in_flight.is_some() {
            // Stays Submitting until the orphaned request comes back.
            self.generation += 1;
        } else {
            self.reset();
        }
        Ok(())
    }

    /// Both images present and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.in_flight.is_none() && self.slots.iter().all(|input| input.image.is_some())
    }

    pub fn begin_submission(&mut self) -> CompareResult<Submission> {
        if self.in_flight.is_some() {
            return Err(CompareError::Busy);
        }

        let request = match (self.slot(SlotId::First), self.slot(SlotId::Second)) {
            (Some(first), Some(second)) => Some(ComparisonRequest {
                first: first.media().clone(),
                second: second.media().clone(),
                model: self.model,
            }),
            _ => None,
        };
        let Some(request) = request else {
            self.activity.record("Submit refused: missing image");
            self.state = WorkflowState::Failed(CompareError::MissingInput);
            return Err(CompareError::MissingInput);
        };

        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.in_flight = Some(ticket);
        self.state = WorkflowState::Submitting;
        self.metrics.record_submitted();
        self.activity
            .record(format!("Comparing with {} (#{})", self.model, ticket.0));

        Ok(Submission { ticket, request })
    }

    /// Applies a completion. Returns `false` when the outcome was dropped,
    /// either because the ticket is unknown or because a slot changed while
    /// the request was in flight. The latter frees the workflow and settles
    /// it to `Idle`.
    pub fn finish(&mut self, ticket: Ticket, outcome: CompareResult<ComparisonResult>) -> bool {
        if self.in_flight != Some(ticket) {
            self.activity
                .record(format!("Ignored unknown response (#{})", ticket.0));
            return false;
        }
        self.in_flight = None;

        if ticket.0 != self.generation {
            self.metrics.record_superseded();
            self.activity
                .record(format!("Ignored stale response (#{})", ticket.0));
            self.state = WorkflowState::Idle;
            return false;
        }

        self.state = match outcome {
            Ok(result) => {
                self.metrics.record_succeeded();
                self.activity.record(format!(
                    "Similarity {:.2}% with {}",
                    result.similarity, result.model_used
                ));
                WorkflowState::Succeeded(result)
            }
            Err(err) => {
                self.metrics.record_failed();
                if let CompareError::Network(detail) = &err {
                    log::warn!("comparison transport failure: {}", detail);
                }
                self.activity.record(format!("Comparison failed: {}", err));
                WorkflowState::Failed(err)
            }
        };
        true
    }

    /// Runs a whole submission against `client`.
    pub async fn submit<C>(&mut self, client: &C) -> CompareResult<ComparisonResult>
    where
        C: CompareClient + ?Sized,
    {
        let submission = self.begin_submission()?;
        let outcome = client.compare(submission.request).await;
        self.finish(submission.ticket, outcome.clone());
        outcome
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }
}
