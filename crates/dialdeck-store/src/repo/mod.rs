pub mod call_log;
pub mod outcome_labels;
pub mod pending_outcomes;

pub use call_log::CallLogRepo;
pub use outcome_labels::OutcomeLabelsRepo;
pub use pending_outcomes::{FlushReport, PendingOutcome, PendingOutcomesRepo};
