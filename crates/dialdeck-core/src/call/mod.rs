pub mod controller;
pub mod telephony;
pub mod timer;

pub use controller::{
    CallController, CallError, ControllerSettings, Readiness, SessionNotice,
    DEFAULT_GRACE_PERIOD,
};
pub use telephony::{ConnectParams, Telephony, TelephonyError, TelephonyEvent};
pub use timer::DurationTimer;
