use crate::dialer::{DialerSequencer, StepState};
use crate::domain::{CallOutcome, CallSession, CallStatus, ContactId, OutcomeId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemDto {
    pub position: usize,
    pub id: ContactId,
    pub display_name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub dial_number: Option<String>,
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDto {
    pub cursor: usize,
    pub complete: bool,
    pub items: Vec<QueueItemDto>,
}

impl QueueDto {
    pub fn from_sequencer(sequencer: &DialerSequencer) -> Self {
        let items = sequencer
            .queue()
            .items()
            .iter()
            .enumerate()
            .map(|(position, contact)| QueueItemDto {
                position,
                id: contact.id.clone(),
                display_name: contact.display_name.clone(),
                company: contact.company.clone(),
                phone: contact.phone.clone(),
                dial_number: contact.dial_number().ok(),
                step: sequencer
                    .step_at(position)
                    .map(step_label)
                    .unwrap_or("pending")
                    .to_string(),
            })
            .collect();
        Self {
            cursor: sequencer.cursor(),
            complete: sequencer.is_complete(),
            items,
        }
    }
}

pub fn step_label(step: &StepState) -> &'static str {
    match step {
        StepState::Pending => "pending",
        StepState::Failed { .. } => "failed",
        StepState::Recorded { .. } => "recorded",
        StepState::Queued { .. } => "queued",
        StepState::Skipped => "skipped",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcomeDto {
    pub id: OutcomeId,
    pub contact_id: ContactId,
    pub caller_id: String,
    pub outcome: String,
    pub notes: Option<String>,
    pub recorded_at: i64,
}

impl From<&CallOutcome> for CallOutcomeDto {
    fn from(outcome: &CallOutcome) -> Self {
        Self {
            id: outcome.id,
            contact_id: outcome.contact_id.clone(),
            caller_id: outcome.caller_id.clone(),
            outcome: outcome.outcome.clone(),
            notes: outcome.notes.clone(),
            recorded_at: outcome.recorded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOutcomeDto {
    pub id: OutcomeId,
    pub contact_id: ContactId,
    pub outcome: String,
    pub notes: Option<String>,
    pub queued_at: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogDto {
    pub session_id: SessionId,
    pub contact_id: Option<ContactId>,
    pub direction: String,
    pub number: String,
    pub final_status: String,
    pub started_at: Option<i64>,
    pub ended_at: i64,
    pub duration_secs: i64,
    pub failure: Option<String>,
    pub outcome: Option<String>,
}

impl CallLogDto {
    /// `None` for sessions that never left `Idle`. A call abandoned before it
    /// was answered is logged as `cancelled`.
    pub fn from_session(session: &CallSession) -> Option<Self> {
        let number = session.target_number()?.to_string();
        let ended_at = session.ended_at()?;
        Some(Self {
            session_id: session.id(),
            contact_id: session.contact_id().cloned(),
            direction: session.direction().as_str().to_string(),
            number,
            final_status: match session.status() {
                CallStatus::Idle => "cancelled".to_string(),
                status => status.as_str().to_string(),
            },
            started_at: session.started_at(),
            ended_at,
            duration_secs: session.talk_secs().unwrap_or(0),
            failure: session.failure().map(str::to_string),
            outcome: None,
        })
    }
}
