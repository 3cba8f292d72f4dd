use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::call::telephony::{ConnectParams, Telephony, TelephonyError, TelephonyEvent};
use crate::call::timer::DurationTimer;
use crate::domain::{normalize_dial_number, validate_dtmf, CallSession, CallStatus, ContactId};
use crate::error::CoreError;
use crate::rules::{next_status, Trigger};
use crate::time::{Clock, SystemClock};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("telephony is not ready")]
    NotReady,
    #[error("call in progress ({0})")]
    CallInProgress(CallStatus),
    #[error("cannot {intent} while {status}")]
    InvalidTransition {
        intent: &'static str,
        status: CallStatus,
    },
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error(transparent)]
    Telephony(#[from] TelephonyError),
    #[error("call controller has been torn down")]
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub grace_period: Duration,
    /// Off by default; the vendor owns ringing timeouts unless this is set.
    pub ring_timeout: Option<Duration>,
    pub caller_id: Option<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            ring_timeout: None,
            caller_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
    Failed(String),
}

/// What the host loop should show or record after driving the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum SessionNotice {
    StatusChanged { from: CallStatus, to: CallStatus },
    Tick { elapsed: String },
    Error { message: String },
    Ignored { trigger: Trigger, status: CallStatus },
    IncomingRejectedBusy { from: String },
    SessionEnded { session: CallSession },
}

/// Owns one call session at a time and the capability that carries it.
pub struct CallController<T: Telephony, C: Clock = SystemClock> {
    telephony: T,
    clock: C,
    settings: ControllerSettings,
    readiness: Readiness,
    session: CallSession,
    timer: DurationTimer,
    entered_at: Instant,
    session_started_at: Instant,
    notices: VecDeque<SessionNotice>,
    torn_down: bool,
}

impl<T: Telephony> CallController<T, SystemClock> {
    pub fn with_system_clock(telephony: T, settings: ControllerSettings) -> Self {
        Self::new(telephony, SystemClock, settings)
    }
}

impl<T: Telephony, C: Clock> CallController<T, C> {
    pub fn new(telephony: T, clock: C, settings: ControllerSettings) -> Self {
        let entered_at = clock.now();
        Self {
            telephony,
            clock,
            settings,
            readiness: Readiness::Uninitialized,
            session: CallSession::idle(),
            timer: DurationTimer::new(),
            entered_at,
            session_started_at: entered_at,
            notices: VecDeque::new(),
            torn_down: false,
        }
    }

    pub fn status(&self) -> CallStatus {
        self.session.status()
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn timer(&self) -> &DurationTimer {
        &self.timer
    }

    pub fn elapsed_display(&self) -> String {
        self.timer.display()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn telephony(&self) -> &T {
        &self.telephony
    }

    pub fn telephony_mut(&mut self) -> &mut T {
        &mut self.telephony
    }

    pub fn drain_notices(&mut self) -> Vec<SessionNotice> {
        self.notices.drain(..).collect()
    }

    /// Registers with the vendor. A failure is kept until the next explicit
    /// call to `initialize`; nothing retries on its own.
    pub fn initialize(&mut self, identity: &str) -> Result<(), CallError> {
        self.ensure_alive()?;
        match self.telephony.initialize(identity) {
            Ok(()) => {
                info!(identity, "telephony ready");
                self.readiness = Readiness::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(identity, error = %err, "telephony initialization failed");
                self.readiness = Readiness::Failed(err.to_string());
                self.notices.push_back(SessionNotice::Error {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    pub fn place_call(
        &mut self,
        number: &str,
        contact_id: Option<ContactId>,
    ) -> Result<(), CallError> {
        self.ensure_alive()?;
        if self.readiness != Readiness::Ready {
            return Err(CallError::NotReady);
        }
        let number = normalize_dial_number(number)?;
        // Queued events, such as the echo of a local hang-up, belong to the
        // previous leg.
        self.drain_events();
        let status = self.status();
        if next_status(status, Trigger::PlaceCall).is_none() {
            return Err(CallError::CallInProgress(status));
        }
        if status == CallStatus::Disconnected {
            self.enter(CallStatus::Idle, None);
        }

        let mut params = ConnectParams::new().with("To", number.clone());
        if let Some(contact_id) = &contact_id {
            params = params.with("contactId", contact_id.as_str());
        }
        if let Some(caller_id) = &self.settings.caller_id {
            params = params.with("callerId", caller_id.clone());
        }

        info!(number = %number, "placing call");
        self.begin(CallSession::outbound(number.clone(), contact_id));
        if let Err(err) = self.telephony.connect(&number, &params) {
            warn!(number = %number, error = %err, "connect failed");
            self.fail(Trigger::Error, err.to_string());
            return Err(err.into());
        }
        Ok(())
    }

    pub fn accept(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        self.ensure_inbound_ringing("accept")?;
        self.telephony.accept_incoming()?;
        Ok(())
    }

    pub fn reject(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        self.ensure_inbound_ringing("reject")?;
        self.telephony.reject_incoming()?;
        self.apply(Trigger::Reject);
        Ok(())
    }

    /// Ends whatever call is live. A connected call stays connected until the
    /// capability reports the disconnect.
    pub fn hang_up(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        match self.status() {
            CallStatus::Connected => {
                self.telephony.disconnect_all();
                Ok(())
            }
            CallStatus::Ringing if self.session.is_inbound() => self.reject(),
            CallStatus::Connecting | CallStatus::Ringing => {
                self.telephony.disconnect_all();
                self.apply(Trigger::HangUp);
                Ok(())
            }
            status => Err(CallError::InvalidTransition {
                intent: "hang up",
                status,
            }),
        }
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<bool, CallError> {
        self.ensure_alive()?;
        self.ensure_connected("mute")?;
        self.telephony.mute(muted)?;
        self.session.set_muted(muted);
        Ok(self.session.muted())
    }

    pub fn toggle_mute(&mut self) -> Result<bool, CallError> {
        let next = !self.session.muted();
        self.set_muted(next)
    }

    pub fn send_digits(&mut self, digits: &str) -> Result<(), CallError> {
        self.ensure_alive()?;
        self.ensure_connected("send digits")?;
        let digits = validate_dtmf(digits)?;
        self.telephony.send_digits(digits)?;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        let status = self.status();
        if status != CallStatus::Failed {
            return Err(CallError::InvalidTransition {
                intent: "reset",
                status,
            });
        }
        self.apply(Trigger::Reset);
        Ok(())
    }

    /// Single entry point for capability events.
    pub fn handle_event(&mut self, event: TelephonyEvent) {
        if self.torn_down {
            return;
        }
        debug!(?event, status = %self.status(), "telephony event");
        match event {
            TelephonyEvent::Incoming { from } => self.handle_incoming(from),
            TelephonyEvent::Ringing => {
                self.apply(Trigger::Ringing);
            }
            TelephonyEvent::Connected => {
                self.apply(Trigger::Connect);
            }
            TelephonyEvent::Disconnected => {
                self.apply(Trigger::Disconnect);
            }
            TelephonyEvent::Cancelled => {
                self.apply(Trigger::Cancel);
            }
            TelephonyEvent::Error { reason } => {
                self.notices.push_back(SessionNotice::Error {
                    message: reason.clone(),
                });
                self.fail(Trigger::Error, reason);
            }
        }
    }

    /// Drains capability events in arrival order, then runs time-based work.
    pub fn pump(&mut self) {
        if self.torn_down {
            return;
        }
        self.drain_events();
        self.advance_time();
    }

    /// Releases the capability. Safe to call more than once; also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let status = self.status();
        if status.is_live() {
            self.telephony.disconnect_all();
            match status {
                CallStatus::Connected => {
                    self.apply(Trigger::Disconnect);
                }
                _ => {
                    self.apply(Trigger::HangUp);
                }
            }
        }
        self.timer.stop(self.clock.now());
        self.telephony.teardown();
        self.torn_down = true;
        debug!("call controller torn down");
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.telephony.poll_event() {
            self.handle_event(event);
        }
    }

    fn advance_time(&mut self) {
        let now = self.clock.now();
        if let Some(elapsed) = self.timer.tick(now) {
            self.notices.push_back(SessionNotice::Tick { elapsed });
        }

        let in_state = now.saturating_duration_since(self.entered_at);
        match self.status() {
            CallStatus::Disconnected if in_state >= self.settings.grace_period => {
                self.apply(Trigger::GraceElapsed);
            }
            CallStatus::Connecting | CallStatus::Ringing => {
                // Measured from dialing, not from the last status change.
                let dialing = now.saturating_duration_since(self.session_started_at);
                if let Some(limit) = self.settings.ring_timeout {
                    if dialing >= limit && !self.session.is_inbound() {
                        self.telephony.disconnect_all();
                        let reason = format!("no answer after {}s", limit.as_secs());
                        self.notices.push_back(SessionNotice::Error {
                            message: reason.clone(),
                        });
                        self.fail(Trigger::RingTimeout, reason);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_incoming(&mut self, from: String) {
        let status = self.status();
        if next_status(status, Trigger::Incoming).is_none() {
            warn!(from = %from, status = %status, "rejecting incoming call while busy");
            if let Err(err) = self.telephony.reject_incoming() {
                self.notices.push_back(SessionNotice::Error {
                    message: err.to_string(),
                });
            }
            self.notices
                .push_back(SessionNotice::IncomingRejectedBusy { from });
            return;
        }
        if status == CallStatus::Disconnected {
            self.enter(CallStatus::Idle, None);
        }
        info!(from = %from, "incoming call");
        self.begin(CallSession::inbound(from));
    }

    fn begin(&mut self, session: CallSession) {
        let from = self.status();
        let to = session.status();
        self.session = session;
        self.entered_at = self.clock.now();
        self.session_started_at = self.entered_at;
        debug!(session = %self.session.id(), %from, %to, "call status changed");
        self.notices
            .push_back(SessionNotice::StatusChanged { from, to });
    }

    fn apply(&mut self, trigger: Trigger) -> Option<CallStatus> {
        let from = self.status();
        let Some(to) = next_status(from, trigger) else {
            debug!(%trigger, status = %from, "trigger ignored");
            self.notices.push_back(SessionNotice::Ignored {
                trigger,
                status: from,
            });
            return None;
        };
        self.enter(to, None);
        Some(to)
    }

    fn fail(&mut self, trigger: Trigger, reason: String) {
        let from = self.status();
        if next_status(from, trigger) != Some(CallStatus::Failed) {
            self.notices.push_back(SessionNotice::Ignored {
                trigger,
                status: from,
            });
            return;
        }
        self.enter(CallStatus::Failed, Some(reason));
    }

    fn enter(&mut self, to: CallStatus, failure: Option<String>) {
        let from = self.status();
        let now = self.clock.now();
        let now_utc = self.clock.now_utc();

        if from == CallStatus::Connected && to != CallStatus::Connected {
            self.timer.stop(now);
        }

        match failure {
            Some(reason) => self.session.fail(reason, now_utc),
            None => self.session.enter(to, now_utc),
        }
        self.entered_at = now;

        debug!(session = %self.session.id(), %from, %to, "call status changed");
        self.notices
            .push_back(SessionNotice::StatusChanged { from, to });

        if to == CallStatus::Connected {
            let elapsed = self.timer.start(now);
            self.notices.push_back(SessionNotice::Tick { elapsed });
        }

        let ended = matches!(to, CallStatus::Disconnected | CallStatus::Failed)
            || (to == CallStatus::Idle && from.is_live());
        if ended {
            self.notices.push_back(SessionNotice::SessionEnded {
                session: self.session.clone(),
            });
        }
        if to == CallStatus::Idle {
            self.session = CallSession::idle();
        }
    }

    fn ensure_alive(&self) -> Result<(), CallError> {
        if self.torn_down {
            Err(CallError::TornDown)
        } else {
            Ok(())
        }
    }

    fn ensure_connected(&self, intent: &'static str) -> Result<(), CallError> {
        match self.status() {
            CallStatus::Connected => Ok(()),
            status => Err(CallError::InvalidTransition { intent, status }),
        }
    }

    fn ensure_inbound_ringing(&self, intent: &'static str) -> Result<(), CallError> {
        let status = self.status();
        if status == CallStatus::Ringing && self.session.is_inbound() {
            Ok(())
        } else {
            Err(CallError::InvalidTransition { intent, status })
        }
    }
}

impl<T: Telephony, C: Clock> Drop for CallController<T, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
