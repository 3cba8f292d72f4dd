use std::collections::VecDeque;

use dialdeck_core::call::{ConnectParams, Telephony, TelephonyError, TelephonyEvent};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Dialing,
    Offered,
    Answered,
}

/// Telephony for an operator who dials on a separate handset and reports each
/// step by key. Events come out in the order they were reported.
#[derive(Debug, Default)]
pub struct ManualTelephony {
    identity: Option<String>,
    leg: Option<Leg>,
    waiting: bool,
    muted: bool,
    digits: String,
    events: VecDeque<TelephonyEvent>,
}

impl ManualTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn sent_digits(&self) -> &str {
        &self.digits
    }

    pub fn report_ringing(&mut self) -> Result<(), TelephonyError> {
        match self.leg {
            Some(Leg::Dialing) => {
                self.events.push_back(TelephonyEvent::Ringing);
                Ok(())
            }
            _ => Err(TelephonyError::NoConnection("outbound")),
        }
    }

    pub fn report_answered(&mut self) -> Result<(), TelephonyError> {
        match self.leg {
            Some(Leg::Dialing) => {
                self.leg = Some(Leg::Answered);
                self.events.push_back(TelephonyEvent::Connected);
                Ok(())
            }
            _ => Err(TelephonyError::NoConnection("outbound")),
        }
    }

    /// The other party ended the call or gave up before it was answered.
    pub fn report_remote_hang_up(&mut self) -> Result<(), TelephonyError> {
        match self.leg.take() {
            Some(Leg::Answered) => self.events.push_back(TelephonyEvent::Disconnected),
            Some(Leg::Dialing | Leg::Offered) => self.events.push_back(TelephonyEvent::Cancelled),
            None => return Err(TelephonyError::NoConnection("active")),
        }
        self.muted = false;
        Ok(())
    }

    pub fn report_incoming(&mut self, from: &str) -> Result<(), TelephonyError> {
        if self.identity.is_none() {
            return Err(TelephonyError::NotInitialized);
        }
        if self.leg.is_some() {
            self.waiting = true;
        } else {
            self.leg = Some(Leg::Offered);
        }
        self.events.push_back(TelephonyEvent::Incoming {
            from: from.to_string(),
        });
        Ok(())
    }

    pub fn report_error(&mut self, reason: &str) {
        self.leg = None;
        self.muted = false;
        self.events.push_back(TelephonyEvent::Error {
            reason: reason.to_string(),
        });
    }
}

impl Telephony for ManualTelephony {
    fn initialize(&mut self, identity: &str) -> Result<(), TelephonyError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(TelephonyError::Registration("identity is empty".to_string()));
        }
        self.identity = Some(identity.to_string());
        Ok(())
    }

    fn connect(&mut self, number: &str, params: &ConnectParams) -> Result<(), TelephonyError> {
        if self.identity.is_none() {
            return Err(TelephonyError::NotInitialized);
        }
        if self.leg.is_some() {
            return Err(TelephonyError::Vendor("line busy".to_string()));
        }
        debug!(number, contact = params.get("contactId"), "dial on handset");
        self.leg = Some(Leg::Dialing);
        Ok(())
    }

    fn accept_incoming(&mut self) -> Result<(), TelephonyError> {
        match self.leg {
            Some(Leg::Offered) => {
                self.leg = Some(Leg::Answered);
                self.events.push_back(TelephonyEvent::Connected);
                Ok(())
            }
            _ => Err(TelephonyError::NoConnection("incoming")),
        }
    }

    fn reject_incoming(&mut self) -> Result<(), TelephonyError> {
        if self.waiting {
            self.waiting = false;
            return Ok(());
        }
        match self.leg {
            Some(Leg::Offered) => {
                self.leg = None;
                Ok(())
            }
            _ => Err(TelephonyError::NoConnection("incoming")),
        }
    }

    fn mute(&mut self, muted: bool) -> Result<(), TelephonyError> {
        if self.leg != Some(Leg::Answered) {
            return Err(TelephonyError::NoConnection("active"));
        }
        self.muted = muted;
        Ok(())
    }

    fn send_digits(&mut self, digits: &str) -> Result<(), TelephonyError> {
        if self.leg != Some(Leg::Answered) {
            return Err(TelephonyError::NoConnection("active"));
        }
        self.digits.push_str(digits);
        Ok(())
    }

    fn disconnect_all(&mut self) {
        match self.leg.take() {
            Some(Leg::Answered) => self.events.push_back(TelephonyEvent::Disconnected),
            Some(Leg::Dialing | Leg::Offered) => self.events.push_back(TelephonyEvent::Cancelled),
            None => {}
        }
        self.waiting = false;
        self.muted = false;
    }

    fn teardown(&mut self) {
        self.identity = None;
        self.leg = None;
        self.waiting = false;
        self.events.clear();
    }

    fn poll_event(&mut self) -> Option<TelephonyEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::ManualTelephony;
    use dialdeck_core::call::{ConnectParams, Telephony, TelephonyError, TelephonyEvent};

    fn drain(telephony: &mut ManualTelephony) -> Vec<TelephonyEvent> {
        std::iter::from_fn(|| telephony.poll_event()).collect()
    }

    #[test]
    fn outbound_call_reports_in_order() {
        let mut telephony = ManualTelephony::new();
        telephony.initialize("agent-7").expect("init");
        telephony
            .connect("+15550100", &ConnectParams::new())
            .expect("connect");
        telephony.report_ringing().expect("ringing");
        telephony.report_answered().expect("answered");
        telephony.mute(true).expect("mute");
        telephony.send_digits("12#").expect("digits");
        telephony.disconnect_all();

        assert_eq!(
            drain(&mut telephony),
            vec![
                TelephonyEvent::Ringing,
                TelephonyEvent::Connected,
                TelephonyEvent::Disconnected
            ]
        );
        assert_eq!(telephony.sent_digits(), "12#");
        assert!(!telephony.is_muted());
    }

    #[test]
    fn disconnect_before_answer_cancels() {
        let mut telephony = ManualTelephony::new();
        telephony.initialize("agent-7").expect("init");
        telephony
            .connect("+15550100", &ConnectParams::new())
            .expect("connect");
        telephony.disconnect_all();
        telephony.disconnect_all();
        assert_eq!(drain(&mut telephony), vec![TelephonyEvent::Cancelled]);
    }

    #[test]
    fn requires_identity_before_connect() {
        let mut telephony = ManualTelephony::new();
        assert_eq!(
            telephony.connect("+15550100", &ConnectParams::new()),
            Err(TelephonyError::NotInitialized)
        );
        assert!(matches!(
            telephony.initialize("  "),
            Err(TelephonyError::Registration(_))
        ));
    }

    #[test]
    fn incoming_while_busy_keeps_current_leg() {
        let mut telephony = ManualTelephony::new();
        telephony.initialize("agent-7").expect("init");
        telephony
            .connect("+15550100", &ConnectParams::new())
            .expect("connect");
        telephony.report_answered().expect("answered");
        telephony.report_incoming("+15550999").expect("incoming");
        telephony.reject_incoming().expect("reject waiting call");

        telephony.mute(true).expect("still connected");
        telephony.report_remote_hang_up().expect("hang up");
        assert_eq!(
            drain(&mut telephony),
            vec![
                TelephonyEvent::Connected,
                TelephonyEvent::Incoming {
                    from: "+15550999".to_string()
                },
                TelephonyEvent::Disconnected
            ]
        );
    }

    #[test]
    fn teardown_drops_queued_events() {
        let mut telephony = ManualTelephony::new();
        telephony.initialize("agent-7").expect("init");
        telephony.report_error("registration expired");
        telephony.teardown();
        assert!(telephony.poll_event().is_none());
        assert!(telephony.identity().is_none());
    }
}
