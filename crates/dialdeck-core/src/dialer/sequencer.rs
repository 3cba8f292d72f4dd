use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::dialer::queue::DialerQueue;
use crate::dialer::recorder::{OutcomeRecorder, OutcomeSink, RecordError};
use crate::domain::{CallOutcome, Contact, ContactId, OutcomeDraft};

/// Where the step under the cursor stands with respect to its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Failed { reason: String, draft: OutcomeDraft },
    Recorded { outcome: CallOutcome },
    Queued { draft: OutcomeDraft },
    Skipped,
}

impl StepState {
    /// Settled steps may be advanced past.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            StepState::Recorded { .. } | StepState::Queued { .. } | StepState::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advanced {
    Moved { cursor: usize },
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("calling list is empty")]
    EmptyQueue,
    #[error("calling list is complete")]
    Complete,
    #[error("record an outcome for {0} or skip it first")]
    OutcomeRequired(ContactId),
    #[error("last outcome for {contact_id} was not recorded: {reason}")]
    RecordFailed { contact_id: ContactId, reason: String },
    #[error("outcome already settled for {0}")]
    AlreadySettled(ContactId),
    #[error("no failed outcome to queue for {0}")]
    NothingToQueue(ContactId),
    #[error("contact not in calling list: {0}")]
    NotFound(ContactId),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Walks a [`DialerQueue`] one contact at a time. The cursor never moves past
/// a contact whose outcome is still unsettled.
#[derive(Debug, Clone)]
pub struct DialerSequencer {
    queue: DialerQueue,
    steps: Vec<StepState>,
    cursor: usize,
    complete: bool,
}

impl DialerSequencer {
    pub fn new(queue: DialerQueue) -> Self {
        let steps = vec![StepState::Pending; queue.len()];
        Self {
            queue,
            steps,
            cursor: 0,
            complete: false,
        }
    }

    pub fn queue(&self) -> &DialerQueue {
        &self.queue
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn current(&self) -> Option<&Contact> {
        if self.complete {
            return None;
        }
        self.queue.get(self.cursor)
    }

    pub fn current_step(&self) -> Option<&StepState> {
        if self.complete {
            return None;
        }
        self.steps.get(self.cursor)
    }

    pub fn step_at(&self, index: usize) -> Option<&StepState> {
        self.steps.get(index)
    }

    /// Number of settled steps and the queue length.
    pub fn progress(&self) -> (usize, usize) {
        let settled = self.steps.iter().filter(|step| step.is_settled()).count();
        (settled, self.queue.len())
    }

    /// Records the outcome for the current contact. A second record for a
    /// settled step is refused; a retry after failure reuses the draft id.
    pub fn record_current<S: OutcomeSink>(
        &mut self,
        now_utc: i64,
        recorder: &OutcomeRecorder<S>,
        label: &str,
        notes: Option<&str>,
    ) -> Result<CallOutcome, SequenceError> {
        let contact_id = self.current_contact_id()?;
        let step = &self.steps[self.cursor];
        if step.is_settled() {
            return Err(SequenceError::AlreadySettled(contact_id));
        }

        let mut draft = recorder.draft(now_utc, &contact_id, label, notes)?;
        if let StepState::Failed { draft: previous, .. } = step {
            draft.id = previous.id;
        }

        match recorder.record_draft(now_utc, &draft) {
            Ok(outcome) => {
                info!(contact = %contact_id, outcome = %outcome.outcome, "outcome recorded for step");
                self.steps[self.cursor] = StepState::Recorded {
                    outcome: outcome.clone(),
                };
                Ok(outcome)
            }
            Err(RecordError::Sink(err)) => {
                self.steps[self.cursor] = StepState::Failed {
                    reason: err.reason.clone(),
                    draft,
                };
                Err(SequenceError::Record(RecordError::Sink(err)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The draft of a failed record, for callers that want to persist it locally.
    pub fn failed_draft(&self) -> Option<&OutcomeDraft> {
        match self.current_step()? {
            StepState::Failed { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Marks a failed record as queued for later delivery, unblocking advance.
    pub fn mark_queued(&mut self) -> Result<(), SequenceError> {
        let contact_id = self.current_contact_id()?;
        let draft = match &self.steps[self.cursor] {
            StepState::Failed { draft, .. } => draft.clone(),
            _ => return Err(SequenceError::NothingToQueue(contact_id)),
        };
        debug!(contact = %contact_id, outcome = %draft.id, "outcome queued for retry");
        self.steps[self.cursor] = StepState::Queued { draft };
        Ok(())
    }

    pub fn skip(&mut self) -> Result<(), SequenceError> {
        let contact_id = self.current_contact_id()?;
        if self.steps[self.cursor].is_settled() {
            return Err(SequenceError::AlreadySettled(contact_id));
        }
        debug!(contact = %contact_id, "step skipped");
        self.steps[self.cursor] = StepState::Skipped;
        Ok(())
    }

    pub fn advance(&mut self) -> Result<Advanced, SequenceError> {
        let contact_id = self.current_contact_id()?;
        match &self.steps[self.cursor] {
            StepState::Pending => return Err(SequenceError::OutcomeRequired(contact_id)),
            StepState::Failed { reason, .. } => {
                return Err(SequenceError::RecordFailed {
                    contact_id,
                    reason: reason.clone(),
                })
            }
            _ => {}
        }

        if self.cursor + 1 < self.queue.len() {
            self.cursor += 1;
            debug!(cursor = self.cursor, "advanced");
            Ok(Advanced::Moved {
                cursor: self.cursor,
            })
        } else {
            self.complete = true;
            info!(contacts = self.queue.len(), "calling list complete");
            Ok(Advanced::Completed)
        }
    }

    /// Moves the cursor to `contact_id`; leaves it where it was if absent.
    pub fn jump_to(&mut self, contact_id: &ContactId) -> Result<usize, SequenceError> {
        if self.complete {
            return Err(SequenceError::Complete);
        }
        let index = self
            .queue
            .position(contact_id)
            .ok_or_else(|| SequenceError::NotFound(contact_id.clone()))?;
        self.cursor = index;
        Ok(index)
    }

    fn current_contact_id(&self) -> Result<ContactId, SequenceError> {
        if self.complete {
            return Err(SequenceError::Complete);
        }
        self.queue
            .get(self.cursor)
            .map(|contact| contact.id.clone())
            .ok_or(SequenceError::EmptyQueue)
    }
}
