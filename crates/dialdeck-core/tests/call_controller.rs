mod common;

use std::time::Duration;

use common::{controller, ready_controller, second, FakeTelephony};
use dialdeck_core::call::{
    CallController, CallError, ControllerSettings, Readiness, SessionNotice, TelephonyEvent,
};
use dialdeck_core::domain::{CallStatus, ContactId};
use dialdeck_core::error::CoreError;
use dialdeck_core::rules::Trigger;
use dialdeck_core::time::ManualClock;

fn statuses(notices: &[SessionNotice]) -> Vec<(CallStatus, CallStatus)> {
    notices
        .iter()
        .filter_map(|notice| match notice {
            SessionNotice::StatusChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn ticks(notices: &[SessionNotice]) -> Vec<String> {
    notices
        .iter()
        .filter_map(|notice| match notice {
            SessionNotice::Tick { elapsed } => Some(elapsed.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn outbound_call_walks_the_table() {
    let (mut controller, telephony, clock) = ready_controller();
    let contact = ContactId::new("42").expect("contact id");

    controller
        .place_call("(555) 010-0199", Some(contact.clone()))
        .expect("place call");
    assert_eq!(controller.status(), CallStatus::Connecting);
    {
        let log = telephony.log.borrow();
        assert_eq!(log.connects.len(), 1);
        let (number, params) = &log.connects[0];
        assert_eq!(number, "5550100199");
        assert_eq!(params.get("To"), Some("5550100199"));
        assert_eq!(params.get("contactId"), Some("42"));
    }

    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Connected);
    assert_eq!(controller.session().started_at(), Some(common::NOW));
    assert_eq!(controller.session().contact_id(), Some(&contact));

    let notices = controller.drain_notices();
    assert_eq!(
        statuses(&notices),
        vec![
            (CallStatus::Idle, CallStatus::Connecting),
            (CallStatus::Connecting, CallStatus::Ringing),
            (CallStatus::Ringing, CallStatus::Connected),
        ]
    );
    assert_eq!(ticks(&notices), vec!["00:00".to_string()]);

    clock.advance(Duration::from_millis(1_200));
    controller.pump();
    clock.advance(Duration::from_millis(300));
    controller.pump();
    assert_eq!(ticks(&controller.drain_notices()), vec!["00:01".to_string()]);

    clock.advance(Duration::from_secs(64));
    telephony.push(TelephonyEvent::Disconnected);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Disconnected);
    assert!(!controller.timer().is_running());
    assert_eq!(controller.session().started_at(), Some(common::NOW));
    assert_eq!(controller.session().talk_secs(), Some(65));

    let notices = controller.drain_notices();
    assert!(notices
        .iter()
        .any(|notice| matches!(notice, SessionNotice::SessionEnded { .. })));

    clock.advance(Duration::from_millis(1_999));
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Disconnected);
    clock.advance(Duration::from_millis(1));
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Idle);
    assert_eq!(controller.session().started_at(), None);
    assert_eq!(controller.session().target_number(), None);
}

#[test]
fn timer_runs_only_while_connected_across_calls() {
    let (mut controller, telephony, clock) = ready_controller();

    for round in 1..=2u32 {
        controller.place_call("5550100", None).expect("place call");
        assert!(!controller.timer().is_running());
        telephony.push(TelephonyEvent::Ringing);
        controller.pump();
        assert!(!controller.timer().is_running());
        telephony.push(TelephonyEvent::Connected);
        controller.pump();
        assert!(controller.timer().is_running());
        assert_eq!(controller.timer().starts(), round);

        clock.advance(Duration::from_secs(3));
        controller.pump();
        assert_eq!(controller.elapsed_display(), "00:03");

        telephony.push(TelephonyEvent::Disconnected);
        controller.pump();
        assert!(!controller.timer().is_running());
        controller.drain_notices();

        clock.advance(Duration::from_secs(5));
        controller.pump();
        assert!(ticks(&controller.drain_notices()).is_empty());
        assert_eq!(controller.status(), CallStatus::Idle);
    }
}

#[test]
fn place_call_while_busy_leaves_session_untouched() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    let before = controller.session().clone();

    let err = controller
        .place_call("5550111", None)
        .expect_err("second call");
    assert_eq!(err, CallError::CallInProgress(CallStatus::Connected));
    assert_eq!(controller.session(), &before);
    assert_eq!(telephony.log.borrow().connects.len(), 1);
}

#[test]
fn invalid_number_never_reaches_capability() {
    let (mut controller, telephony, _clock) = ready_controller();
    let err = controller.place_call("   ", None).expect_err("empty");
    assert_eq!(err, CallError::Invalid(CoreError::EmptyPhoneNumber));
    let err = controller.place_call("call-me", None).expect_err("letters");
    assert!(matches!(err, CallError::Invalid(CoreError::InvalidPhoneNumber(_))));
    assert!(telephony.log.borrow().connects.is_empty());
    assert_eq!(controller.status(), CallStatus::Idle);
}

#[test]
fn mute_pair_restores_unmuted() {
    let (mut controller, telephony, _clock) = ready_controller();
    let err = controller.set_muted(true).expect_err("not connected");
    assert_eq!(
        err,
        CallError::InvalidTransition {
            intent: "mute",
            status: CallStatus::Idle
        }
    );

    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();

    assert!(controller.toggle_mute().expect("mute"));
    assert!(controller.session().muted());
    assert!(!controller.toggle_mute().expect("unmute"));
    assert!(!controller.session().muted());
    assert_eq!(telephony.log.borrow().mutes, vec![true, false]);

    controller.set_muted(true).expect("mute again");
    telephony.push(TelephonyEvent::Disconnected);
    controller.pump();
    assert!(!controller.session().muted());
}

#[test]
fn digits_only_while_connected() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    assert!(controller.send_digits("1").is_err());

    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    controller.send_digits("12#").expect("digits");
    assert!(matches!(
        controller.send_digits("9a"),
        Err(CallError::Invalid(CoreError::InvalidDigits(_)))
    ));
    assert_eq!(telephony.log.borrow().digits, vec!["12#".to_string()]);
}

#[test]
fn incoming_call_while_busy_is_rejected() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    telephony.push(TelephonyEvent::Incoming {
        from: "5550999".to_string(),
    });
    controller.pump();

    assert_eq!(controller.status(), CallStatus::Connected);
    assert_eq!(controller.session().target_number(), Some("5550100"));
    assert_eq!(telephony.log.borrow().rejected, 1);
    assert!(controller.drain_notices().contains(&SessionNotice::IncomingRejectedBusy {
        from: "5550999".to_string()
    }));
}

#[test]
fn inbound_call_can_be_accepted() {
    let (mut controller, telephony, _clock) = ready_controller();
    telephony.push(TelephonyEvent::Incoming {
        from: "5550999".to_string(),
    });
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Ringing);
    assert!(controller.session().is_inbound());

    controller.accept().expect("accept");
    assert_eq!(telephony.log.borrow().accepted, 1);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Connected);
    assert!(controller.timer().is_running());
}

#[test]
fn inbound_call_can_be_rejected() {
    let (mut controller, telephony, _clock) = ready_controller();
    telephony.push(TelephonyEvent::Incoming {
        from: "5550999".to_string(),
    });
    controller.pump();
    controller.reject().expect("reject");
    assert_eq!(controller.status(), CallStatus::Idle);
    assert_eq!(telephony.log.borrow().rejected, 1);
}

#[test]
fn accept_is_refused_for_outbound_ringing() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    controller.pump();
    assert!(matches!(
        controller.accept(),
        Err(CallError::InvalidTransition {
            intent: "accept",
            ..
        })
    ));
    assert_eq!(telephony.log.borrow().accepted, 0);
}

#[test]
fn events_without_a_row_are_reported_and_ignored() {
    let (mut controller, telephony, _clock) = ready_controller();
    telephony.push(TelephonyEvent::Connected);
    telephony.push(TelephonyEvent::Disconnected);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Idle);
    let notices = controller.drain_notices();
    assert_eq!(
        notices,
        vec![
            SessionNotice::Ignored {
                trigger: Trigger::Connect,
                status: CallStatus::Idle
            },
            SessionNotice::Ignored {
                trigger: Trigger::Disconnect,
                status: CallStatus::Idle
            },
        ]
    );
}

#[test]
fn callee_declining_before_answer_returns_to_idle() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Cancelled);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Idle);
    assert!(!controller.timer().is_running());
    assert_eq!(controller.timer().starts(), 0);
}

#[test]
fn mid_call_error_fails_until_reset() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    telephony.push(TelephonyEvent::Error {
        reason: "media lost".to_string(),
    });
    controller.pump();

    assert_eq!(controller.status(), CallStatus::Failed);
    assert_eq!(controller.session().failure(), Some("media lost"));
    assert!(!controller.timer().is_running());
    assert!(controller.drain_notices().contains(&SessionNotice::Error {
        message: "media lost".to_string()
    }));

    assert_eq!(
        controller.place_call("5550100", None),
        Err(CallError::CallInProgress(CallStatus::Failed))
    );
    controller.reset().expect("reset");
    assert_eq!(controller.status(), CallStatus::Idle);
    controller.place_call("5550100", None).expect("retry");
    assert_eq!(telephony.log.borrow().connects.len(), 2);
}

#[test]
fn connect_error_moves_to_failed() {
    let (mut controller, telephony, _clock) = ready_controller();
    telephony.log.borrow_mut().fail_connect = Some("bad token".to_string());
    let err = controller.place_call("5550100", None).expect_err("connect");
    assert!(matches!(err, CallError::Telephony(_)));
    assert_eq!(controller.status(), CallStatus::Failed);
    assert!(controller
        .session()
        .failure()
        .is_some_and(|reason| reason.contains("bad token")));
}

#[test]
fn initialization_failure_blocks_calls_without_retry() {
    let telephony = FakeTelephony::default();
    telephony.log.borrow_mut().fail_init = Some("token expired".to_string());
    let mut controller = CallController::new(
        telephony.clone(),
        ManualClock::new(common::NOW),
        ControllerSettings::default(),
    );

    assert!(controller.initialize("agent-7").is_err());
    assert!(matches!(controller.readiness(), Readiness::Failed(reason) if reason.contains("token expired")));
    assert_eq!(
        controller.place_call("5550100", None),
        Err(CallError::NotReady)
    );
    controller.pump();
    assert!(matches!(controller.readiness(), Readiness::Failed(_)));
    assert!(telephony.log.borrow().connects.is_empty());

    telephony.log.borrow_mut().fail_init = None;
    controller.initialize("agent-7").expect("manual re-init");
    assert_eq!(controller.readiness(), &Readiness::Ready);
}

#[test]
fn ring_timeout_fails_unanswered_outbound_call() {
    let (mut controller, telephony, clock) = controller(ControllerSettings {
        ring_timeout: Some(Duration::from_secs(30)),
        ..ControllerSettings::default()
    });
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    controller.pump();

    clock.advance(Duration::from_secs(29));
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Ringing);

    clock.advance(second());
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Failed);
    assert_eq!(controller.session().failure(), Some("no answer after 30s"));
    assert_eq!(telephony.log.borrow().disconnect_all, 1);
}

#[test]
fn ring_timeout_counts_from_dialing() {
    let (mut controller, telephony, clock) = controller(ControllerSettings {
        ring_timeout: Some(Duration::from_secs(30)),
        ..ControllerSettings::default()
    });
    controller.place_call("5550100", None).expect("place call");

    clock.advance(Duration::from_secs(25));
    telephony.push(TelephonyEvent::Ringing);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Ringing);

    clock.advance(Duration::from_secs(5));
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Failed);
    assert_eq!(controller.session().failure(), Some("no answer after 30s"));
}

#[test]
fn hang_up_echo_does_not_end_the_next_call() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    controller.hang_up().expect("hang up");
    assert_eq!(controller.status(), CallStatus::Idle);
    assert_eq!(
        telephony.log.borrow().events.back(),
        Some(&TelephonyEvent::Cancelled)
    );
    controller.drain_notices();

    controller.place_call("5550101", None).expect("next call");
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Connecting);
    assert_eq!(controller.session().target_number(), Some("5550101"));
    assert!(controller.drain_notices().contains(&SessionNotice::Ignored {
        trigger: Trigger::Cancel,
        status: CallStatus::Idle
    }));

    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Connected);
}

#[test]
fn ring_timeout_echo_is_absorbed_before_retry() {
    let (mut controller, telephony, clock) = controller(ControllerSettings {
        ring_timeout: Some(Duration::from_secs(30)),
        ..ControllerSettings::default()
    });
    controller.place_call("5550100", None).expect("place call");
    clock.advance(Duration::from_secs(30));
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Failed);

    controller.reset().expect("reset");
    controller.place_call("5550100", None).expect("retry");
    controller.pump();
    assert_eq!(controller.status(), CallStatus::Connecting);
    assert!(telephony.log.borrow().events.is_empty());
}

#[test]
fn new_call_during_grace_period_starts_fresh_session() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    telephony.push(TelephonyEvent::Disconnected);
    controller.pump();
    let finished = controller.session().id();

    controller.place_call("5550111", None).expect("next call");
    assert_eq!(controller.status(), CallStatus::Connecting);
    assert_ne!(controller.session().id(), finished);
    assert_eq!(controller.session().started_at(), None);
    assert_eq!(controller.session().target_number(), Some("5550111"));
}

#[test]
fn hang_up_waits_for_disconnect_when_connected() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();

    controller.hang_up().expect("hang up");
    assert_eq!(telephony.log.borrow().disconnect_all, 1);
    assert_eq!(controller.status(), CallStatus::Connected);

    controller.pump();
    assert_eq!(controller.status(), CallStatus::Disconnected);
}

#[test]
fn hang_up_before_answer_returns_to_idle() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    controller.hang_up().expect("hang up");
    assert_eq!(controller.status(), CallStatus::Idle);
    assert_eq!(telephony.log.borrow().disconnect_all, 1);
    assert!(controller.hang_up().is_err());
}

#[test]
fn teardown_runs_once_on_drop() {
    let (mut controller, telephony, _clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();
    drop(controller);

    let log = telephony.log.borrow();
    assert_eq!(log.disconnect_all, 1);
    assert_eq!(log.teardown, 1);
}

#[test]
fn torn_down_controller_is_inert() {
    let (mut controller, telephony, clock) = ready_controller();
    controller.place_call("5550100", None).expect("place call");
    telephony.push(TelephonyEvent::Ringing);
    telephony.push(TelephonyEvent::Connected);
    controller.pump();

    controller.teardown();
    controller.teardown();
    assert!(controller.is_torn_down());
    assert!(!controller.timer().is_running());
    controller.drain_notices();

    telephony.push(TelephonyEvent::Connected);
    clock.advance(Duration::from_secs(5));
    controller.pump();
    assert!(controller.drain_notices().is_empty());
    assert_eq!(
        controller.place_call("5550100", None),
        Err(CallError::TornDown)
    );
    assert_eq!(controller.set_muted(true), Err(CallError::TornDown));

    drop(controller);
    let log = telephony.log.borrow();
    assert_eq!(log.disconnect_all, 1);
    assert_eq!(log.teardown, 1);
}

#[test]
fn idle_teardown_skips_disconnect() {
    let (controller, telephony, _clock) = ready_controller();
    drop(controller);
    let log = telephony.log.borrow();
    assert_eq!(log.disconnect_all, 0);
    assert_eq!(log.teardown, 1);
}
