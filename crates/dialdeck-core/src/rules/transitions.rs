use crate::domain::CallStatus;
use serde::Serialize;
use std::fmt;

/// Anything that can move a call session: operator intents, capability
/// events and elapsed timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    PlaceCall,
    Incoming,
    Ringing,
    Connect,
    Cancel,
    Disconnect,
    Error,
    Reject,
    HangUp,
    GraceElapsed,
    RingTimeout,
    Reset,
}

impl Trigger {
    pub const ALL: [Trigger; 12] = [
        Trigger::PlaceCall,
        Trigger::Incoming,
        Trigger::Ringing,
        Trigger::Connect,
        Trigger::Cancel,
        Trigger::Disconnect,
        Trigger::Error,
        Trigger::Reject,
        Trigger::HangUp,
        Trigger::GraceElapsed,
        Trigger::RingTimeout,
        Trigger::Reset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::PlaceCall => "place-call",
            Trigger::Incoming => "incoming",
            Trigger::Ringing => "ringing",
            Trigger::Connect => "connect",
            Trigger::Cancel => "cancel",
            Trigger::Disconnect => "disconnect",
            Trigger::Error => "error",
            Trigger::Reject => "reject",
            Trigger::HangUp => "hang-up",
            Trigger::GraceElapsed => "grace-elapsed",
            Trigger::RingTimeout => "ring-timeout",
            Trigger::Reset => "reset",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call-session transition table. `None` means the trigger has no effect
/// in `from` and must be reported, not applied.
pub fn next_status(from: CallStatus, trigger: Trigger) -> Option<CallStatus> {
    use CallStatus::*;

    match (from, trigger) {
        (Idle, Trigger::PlaceCall) => Some(Connecting),
        (Disconnected, Trigger::PlaceCall) => Some(Connecting),
        (Idle | Disconnected, Trigger::Incoming) => Some(Ringing),
        (Connecting, Trigger::Ringing) => Some(Ringing),
        (Ringing, Trigger::Connect) => Some(Connected),
        (Ringing, Trigger::Reject) => Some(Idle),
        (Connecting | Ringing, Trigger::Cancel) => Some(Idle),
        (Connecting | Ringing, Trigger::Disconnect) => Some(Idle),
        (Connecting | Ringing, Trigger::HangUp) => Some(Idle),
        (Connected, Trigger::Disconnect) => Some(Disconnected),
        (Connecting | Ringing | Connected, Trigger::Error) => Some(Failed),
        (Connecting | Ringing, Trigger::RingTimeout) => Some(Failed),
        (Disconnected, Trigger::GraceElapsed) => Some(Idle),
        (Failed, Trigger::Reset) => Some(Idle),
        _ => None,
    }
}
