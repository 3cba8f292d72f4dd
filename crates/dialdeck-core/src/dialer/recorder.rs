use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    normalize_notes, CallOutcome, ContactId, OutcomeCatalog, OutcomeDraft, OutcomeId,
};

pub const MAX_NOTES_CHARS: usize = 4_000;

/// Why the backend did not take an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SinkError {
    pub reason: String,
    /// False when the backend refused the outcome itself; resending the same
    /// draft will fail again.
    pub retryable: bool,
}

impl SinkError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: false,
        }
    }
}

/// Wherever outcomes are persisted. The backend owns them once this returns `Ok`.
pub trait OutcomeSink {
    fn send_outcome(&self, draft: &OutcomeDraft) -> Result<(), SinkError>;
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for &S {
    fn send_outcome(&self, draft: &OutcomeDraft) -> Result<(), SinkError> {
        (**self).send_outcome(draft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("unknown outcome: {0}")]
    UnknownOutcome(String),
    #[error("caller id is not configured")]
    MissingCallerId,
    #[error("notes too long ({0} characters, max {max})", max = MAX_NOTES_CHARS)]
    NotesTooLong(usize),
    #[error("failed to record outcome: {0}")]
    Sink(#[from] SinkError),
}

pub struct OutcomeRecorder<S: OutcomeSink> {
    sink: S,
    catalog: OutcomeCatalog,
    caller_id: String,
}

impl<S: OutcomeSink> OutcomeRecorder<S> {
    pub fn new(sink: S, catalog: OutcomeCatalog, caller_id: String) -> Self {
        Self {
            sink,
            catalog,
            caller_id,
        }
    }

    pub fn catalog(&self) -> &OutcomeCatalog {
        &self.catalog
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Validates everything that can be checked without the backend.
    pub fn draft(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        label: &str,
        notes: Option<&str>,
    ) -> Result<OutcomeDraft, RecordError> {
        if self.caller_id.trim().is_empty() {
            return Err(RecordError::MissingCallerId);
        }
        let outcome = self
            .catalog
            .find(label)
            .ok_or_else(|| RecordError::UnknownOutcome(label.trim().to_string()))?;
        let notes = normalize_notes(notes);
        if let Some(notes) = &notes {
            let count = notes.chars().count();
            if count > MAX_NOTES_CHARS {
                return Err(RecordError::NotesTooLong(count));
            }
        }
        Ok(OutcomeDraft {
            id: OutcomeId::new(),
            contact_id: contact_id.clone(),
            caller_id: self.caller_id.trim().to_string(),
            outcome: outcome.label.clone(),
            notes,
            created_at: now_utc,
        })
    }

    pub fn record(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        label: &str,
        notes: Option<&str>,
    ) -> Result<CallOutcome, RecordError> {
        let draft = self.draft(now_utc, contact_id, label, notes)?;
        self.record_draft(now_utc, &draft)
    }

    /// Sends an already validated draft. Resending keeps the draft id.
    pub fn record_draft(
        &self,
        now_utc: i64,
        draft: &OutcomeDraft,
    ) -> Result<CallOutcome, RecordError> {
        match self.sink.send_outcome(draft) {
            Ok(()) => {
                debug!(outcome = %draft.id, contact = %draft.contact_id, "outcome recorded");
                Ok(draft.clone().into_recorded(now_utc))
            }
            Err(err) => {
                warn!(outcome = %draft.id, contact = %draft.contact_id, error = %err, "outcome not recorded");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OutcomeRecorder, OutcomeSink, RecordError, SinkError, MAX_NOTES_CHARS};
    use crate::domain::{default_outcome_labels, ContactId, OutcomeCatalog, OutcomeDraft};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemorySink {
        sent: RefCell<Vec<OutcomeDraft>>,
        fail: Option<String>,
    }

    impl OutcomeSink for MemorySink {
        fn send_outcome(&self, draft: &OutcomeDraft) -> Result<(), SinkError> {
            if let Some(reason) = &self.fail {
                return Err(SinkError::new(reason.clone()));
            }
            self.sent.borrow_mut().push(draft.clone());
            Ok(())
        }
    }

    fn recorder(sink: MemorySink) -> OutcomeRecorder<MemorySink> {
        let catalog = OutcomeCatalog::new(default_outcome_labels()).unwrap();
        OutcomeRecorder::new(sink, catalog, "agent-7".to_string())
    }

    #[test]
    fn record_uses_catalog_spelling() {
        let recorder = recorder(MemorySink::default());
        let contact = ContactId::new("c-1").unwrap();
        let outcome = recorder
            .record(100, &contact, "no answer", Some("  rang out "))
            .unwrap();
        assert_eq!(outcome.outcome, "No Answer");
        assert_eq!(outcome.notes.as_deref(), Some("rang out"));
        assert_eq!(outcome.caller_id, "agent-7");
        assert_eq!(recorder.sink().sent.borrow().len(), 1);
    }

    #[test]
    fn unknown_label_never_reaches_sink() {
        let recorder = recorder(MemorySink::default());
        let contact = ContactId::new("c-1").unwrap();
        let err = recorder.record(100, &contact, "Maybe", None).unwrap_err();
        assert_eq!(err, RecordError::UnknownOutcome("Maybe".to_string()));
        assert!(recorder.sink().sent.borrow().is_empty());
    }

    #[test]
    fn sink_failure_is_reported() {
        let recorder = recorder(MemorySink {
            fail: Some("503 service unavailable".to_string()),
            ..Default::default()
        });
        let contact = ContactId::new("c-1").unwrap();
        let err = recorder
            .record(100, &contact, "Interested", None)
            .unwrap_err();
        assert!(matches!(err, RecordError::Sink(_)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn overlong_notes_are_rejected() {
        let recorder = recorder(MemorySink::default());
        let contact = ContactId::new("c-1").unwrap();
        let notes = "x".repeat(MAX_NOTES_CHARS + 1);
        let err = recorder
            .record(100, &contact, "Interested", Some(&notes))
            .unwrap_err();
        assert_eq!(err, RecordError::NotesTooLong(MAX_NOTES_CHARS + 1));
    }

    #[test]
    fn blank_caller_id_is_rejected() {
        let catalog = OutcomeCatalog::new(default_outcome_labels()).unwrap();
        let recorder = OutcomeRecorder::new(MemorySink::default(), catalog, " ".to_string());
        let contact = ContactId::new("c-1").unwrap();
        assert_eq!(
            recorder.record(1, &contact, "Interested", None).unwrap_err(),
            RecordError::MissingCallerId
        );
    }
}
