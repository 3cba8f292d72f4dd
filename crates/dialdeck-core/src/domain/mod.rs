pub mod contact;
pub mod ids;
pub mod outcome;
pub mod phone;
pub mod session;

pub use contact::Contact;
pub use ids::{ContactId, OutcomeId, SessionId};
pub use outcome::{
    default_outcome_labels, normalize_notes, CallOutcome, OutcomeCatalog, OutcomeDraft,
    OutcomeLabel,
};
pub use phone::{normalize_dial_number, validate_dtmf};
pub use session::{CallDirection, CallSession, CallStatus};
