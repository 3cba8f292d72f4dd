use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelephonyError {
    #[error("telephony not initialized")]
    NotInitialized,
    #[error("registration failed: {0}")]
    Registration(String),
    #[error("no {0} connection")]
    NoConnection(&'static str),
    #[error("telephony error: {0}")]
    Vendor(String),
}

/// Lifecycle events emitted by the vendor, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelephonyEvent {
    Incoming { from: String },
    Ringing,
    Connected,
    Disconnected,
    Cancelled,
    Error { reason: String },
}

/// Extra key/values forwarded to the vendor with an outbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectParams {
    values: BTreeMap<String, String>,
}

impl ConnectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The vendor telephony SDK seen as an opaque capability.
///
/// `connect` only starts a call; its progress is reported through
/// [`Telephony::poll_event`]. Implementations must hand events out in the
/// order they occurred and must not drop any.
pub trait Telephony {
    fn initialize(&mut self, identity: &str) -> Result<(), TelephonyError>;
    fn connect(&mut self, number: &str, params: &ConnectParams) -> Result<(), TelephonyError>;
    fn accept_incoming(&mut self) -> Result<(), TelephonyError>;
    fn reject_incoming(&mut self) -> Result<(), TelephonyError>;
    fn mute(&mut self, muted: bool) -> Result<(), TelephonyError>;
    fn send_digits(&mut self, digits: &str) -> Result<(), TelephonyError>;
    /// Always safe to call, with or without a live connection.
    fn disconnect_all(&mut self);
    fn teardown(&mut self);
    fn poll_event(&mut self) -> Option<TelephonyEvent>;
}
