use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("contact id is required")]
    EmptyContactId,
    #[error("phone number is required")]
    EmptyPhoneNumber,
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("invalid dtmf digits: {0}")]
    InvalidDigits(String),
    #[error("outcome label is required")]
    EmptyOutcomeLabel,
    #[error("duplicate outcome label: {0}")]
    DuplicateOutcomeLabel(String),
    #[error("invalid color for outcome {label}: {value}")]
    InvalidOutcomeColor { label: String, value: String },
    #[error("invalid timestamp")]
    InvalidTimestamp,
}
