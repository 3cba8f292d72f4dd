use crate::domain::ids::{ContactId, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Idle,
    Connecting,
    Ringing,
    Connected,
    Disconnected,
    Failed,
}

impl CallStatus {
    pub const ALL: [CallStatus; 6] = [
        CallStatus::Idle,
        CallStatus::Connecting,
        CallStatus::Ringing,
        CallStatus::Connected,
        CallStatus::Disconnected,
        CallStatus::Failed,
    ];

    /// A call is live while the capability holds (or is setting up) a connection.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            CallStatus::Connecting | CallStatus::Ringing | CallStatus::Connected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Idle => "idle",
            CallStatus::Connecting => "connecting",
            CallStatus::Ringing => "ringing",
            CallStatus::Connected => "connected",
            CallStatus::Disconnected => "disconnected",
            CallStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        CallStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Outbound,
    Inbound,
}

impl CallDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            CallDirection::Outbound => "outbound",
            CallDirection::Inbound => "inbound",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "outbound" => Some(CallDirection::Outbound),
            "inbound" => Some(CallDirection::Inbound),
            _ => None,
        }
    }
}

/// One call attempt. Fields are private so the mute and start-time
/// invariants can only change through [`CallSession::enter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSession {
    id: SessionId,
    status: CallStatus,
    direction: CallDirection,
    target_number: Option<String>,
    contact_id: Option<ContactId>,
    started_at: Option<i64>,
    ended_at: Option<i64>,
    muted: bool,
    failure: Option<String>,
}

impl Default for CallSession {
    fn default() -> Self {
        Self::idle()
    }
}

impl CallSession {
    pub fn idle() -> Self {
        Self {
            id: SessionId::new(),
            status: CallStatus::Idle,
            direction: CallDirection::Outbound,
            target_number: None,
            contact_id: None,
            started_at: None,
            ended_at: None,
            muted: false,
            failure: None,
        }
    }

    pub fn outbound(number: String, contact_id: Option<ContactId>) -> Self {
        Self {
            status: CallStatus::Connecting,
            direction: CallDirection::Outbound,
            target_number: Some(number),
            contact_id,
            ..Self::idle()
        }
    }

    pub fn inbound(from: String) -> Self {
        Self {
            status: CallStatus::Ringing,
            direction: CallDirection::Inbound,
            target_number: Some(from),
            ..Self::idle()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    pub fn target_number(&self) -> Option<&str> {
        self.target_number.as_deref()
    }

    pub fn contact_id(&self) -> Option<&ContactId> {
        self.contact_id.as_ref()
    }

    pub fn started_at(&self) -> Option<i64> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<i64> {
        self.ended_at
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == CallDirection::Inbound
    }

    pub(crate) fn enter(&mut self, next: CallStatus, now_utc: i64) {
        if next == CallStatus::Connected && self.started_at.is_none() {
            self.started_at = Some(now_utc);
        }
        if next != CallStatus::Connected {
            self.muted = false;
        }
        let ending = matches!(next, CallStatus::Disconnected | CallStatus::Failed)
            || (next == CallStatus::Idle && self.status.is_live());
        if ending {
            self.ended_at = Some(now_utc);
        }
        self.status = next;
    }

    pub(crate) fn fail(&mut self, reason: String, now_utc: i64) {
        self.enter(CallStatus::Failed, now_utc);
        self.failure = Some(reason);
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        if self.status == CallStatus::Connected {
            self.muted = muted;
        }
    }

    /// Whole seconds between connect and the end of the call, if it connected.
    pub fn talk_secs(&self) -> Option<i64> {
        let started = self.started_at?;
        let ended = self.ended_at?;
        Some((ended - started).max(0))
    }
}
