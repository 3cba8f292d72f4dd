#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use dialdeck_core::call::{
    CallController, ConnectParams, ControllerSettings, Telephony, TelephonyError, TelephonyEvent,
};
use dialdeck_core::dialer::{OutcomeSink, SinkError};
use dialdeck_core::domain::{Contact, ContactId, OutcomeDraft};
use dialdeck_core::time::ManualClock;

pub const NOW: i64 = 1_700_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeLeg {
    Dialing,
    Offered,
    Answered,
}

#[derive(Debug, Default)]
pub struct FakeLog {
    pub initialized: Option<String>,
    pub connects: Vec<(String, ConnectParams)>,
    pub accepted: usize,
    pub rejected: usize,
    pub mutes: Vec<bool>,
    pub digits: Vec<String>,
    pub disconnect_all: usize,
    pub teardown: usize,
    pub events: VecDeque<TelephonyEvent>,
    pub leg: Option<FakeLeg>,
    pub fail_init: Option<String>,
    pub fail_connect: Option<String>,
}

/// Scripted capability. The log is shared so it can be inspected after the
/// controller is dropped. Like a vendor, `disconnect_all` answers with
/// `Disconnected` or `Cancelled` for whatever leg is live.
#[derive(Debug, Clone, Default)]
pub struct FakeTelephony {
    pub log: Rc<RefCell<FakeLog>>,
}

impl FakeTelephony {
    pub fn push(&self, event: TelephonyEvent) {
        let mut log = self.log.borrow_mut();
        match &event {
            TelephonyEvent::Incoming { .. } if log.leg.is_none() => {
                log.leg = Some(FakeLeg::Offered)
            }
            TelephonyEvent::Connected => log.leg = Some(FakeLeg::Answered),
            TelephonyEvent::Disconnected
            | TelephonyEvent::Cancelled
            | TelephonyEvent::Error { .. } => log.leg = None,
            _ => {}
        }
        log.events.push_back(event);
    }
}

impl Telephony for FakeTelephony {
    fn initialize(&mut self, identity: &str) -> Result<(), TelephonyError> {
        let mut log = self.log.borrow_mut();
        if let Some(reason) = &log.fail_init {
            return Err(TelephonyError::Registration(reason.clone()));
        }
        log.initialized = Some(identity.to_string());
        Ok(())
    }

    fn connect(&mut self, number: &str, params: &ConnectParams) -> Result<(), TelephonyError> {
        let mut log = self.log.borrow_mut();
        if let Some(reason) = &log.fail_connect {
            return Err(TelephonyError::Vendor(reason.clone()));
        }
        log.connects.push((number.to_string(), params.clone()));
        log.leg = Some(FakeLeg::Dialing);
        Ok(())
    }

    fn accept_incoming(&mut self) -> Result<(), TelephonyError> {
        self.log.borrow_mut().accepted += 1;
        Ok(())
    }

    fn reject_incoming(&mut self) -> Result<(), TelephonyError> {
        let mut log = self.log.borrow_mut();
        log.rejected += 1;
        if log.leg == Some(FakeLeg::Offered) {
            log.leg = None;
        }
        Ok(())
    }

    fn mute(&mut self, muted: bool) -> Result<(), TelephonyError> {
        self.log.borrow_mut().mutes.push(muted);
        Ok(())
    }

    fn send_digits(&mut self, digits: &str) -> Result<(), TelephonyError> {
        self.log.borrow_mut().digits.push(digits.to_string());
        Ok(())
    }

    fn disconnect_all(&mut self) {
        let mut log = self.log.borrow_mut();
        log.disconnect_all += 1;
        match log.leg.take() {
            Some(FakeLeg::Answered) => log.events.push_back(TelephonyEvent::Disconnected),
            Some(FakeLeg::Dialing | FakeLeg::Offered) => {
                log.events.push_back(TelephonyEvent::Cancelled)
            }
            None => {}
        }
    }

    fn teardown(&mut self) {
        self.log.borrow_mut().teardown += 1;
    }

    fn poll_event(&mut self) -> Option<TelephonyEvent> {
        self.log.borrow_mut().events.pop_front()
    }
}

pub type TestController = CallController<FakeTelephony, ManualClock>;

pub fn controller(settings: ControllerSettings) -> (TestController, FakeTelephony, ManualClock) {
    let telephony = FakeTelephony::default();
    let clock = ManualClock::new(NOW);
    let mut controller = CallController::new(telephony.clone(), clock.clone(), settings);
    controller.initialize("agent-7").expect("initialize");
    controller.drain_notices();
    (controller, telephony, clock)
}

pub fn ready_controller() -> (TestController, FakeTelephony, ManualClock) {
    controller(ControllerSettings::default())
}

pub fn second() -> Duration {
    Duration::from_secs(1)
}

#[derive(Debug, Default)]
pub struct FakeSink {
    pub sent: RefCell<Vec<OutcomeDraft>>,
    pub failures: RefCell<VecDeque<String>>,
}

impl FakeSink {
    pub fn fail_next(&self, reason: &str) {
        self.failures.borrow_mut().push_back(reason.to_string());
    }
}

impl OutcomeSink for FakeSink {
    fn send_outcome(&self, draft: &OutcomeDraft) -> Result<(), SinkError> {
        if let Some(reason) = self.failures.borrow_mut().pop_front() {
            return Err(SinkError::new(reason));
        }
        self.sent.borrow_mut().push(draft.clone());
        Ok(())
    }
}

pub fn contact(id: &str, name: &str, phone: &str) -> Contact {
    Contact {
        id: ContactId::new(id).expect("contact id"),
        display_name: name.to_string(),
        phone: Some(phone.to_string()),
        company: None,
    }
}
