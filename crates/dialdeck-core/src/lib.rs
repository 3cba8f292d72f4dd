pub mod call;
pub mod dialer;
pub mod domain;
pub mod dto;
pub mod error;
pub mod rules;
pub mod time;

pub use call::{CallController, CallError, ControllerSettings, SessionNotice, Telephony};
pub use dialer::{DialerQueue, DialerSequencer, OutcomeRecorder, OutcomeSink};
pub use domain::*;
pub use dto::*;
pub use error::CoreError;
