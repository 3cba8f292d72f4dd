use anyhow::{anyhow, Context as _, Result};
use dialdeck_core::call::{CallController, ControllerSettings, Readiness, SessionNotice};
use dialdeck_core::dialer::{
    Advanced, DialerSequencer, OutcomeRecorder, OutcomeSink, RecordError, SequenceError, StepState,
};
use dialdeck_core::domain::{CallDirection, CallSession};
use dialdeck_core::dto::QueueDto;
use dialdeck_core::time::{Clock, SystemClock};
use dialdeck_store::Store;
use tracing::{debug, info};

use crate::app::{App, CallView};
use crate::telephony::ManualTelephony;

const HISTORY_LIMIT: i64 = 20;
const ANONYMOUS_CALLER: &str = "anonymous";

#[derive(Debug, Clone)]
pub enum Action {
    Refresh,
    Tick,
    PlaceCall,
    HangUp,
    Accept,
    Reject,
    ToggleMute,
    SendDigits(String),
    Reset,
    Reinitialize,
    Record { label: String, notes: Option<String> },
    QueueFailed,
    Skip,
    Advance,
    FlushPending,
    LoadHistory,
    Report(Report),
}

/// Call progress the operator saw on the handset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Ringing,
    Answered,
    RemoteHangUp,
    Incoming,
    Error,
}

/// Everything a focus session owns besides the screen.
pub struct Workspace<'a, S: OutcomeSink, C: Clock = SystemClock> {
    pub store: &'a Store,
    pub controller: CallController<ManualTelephony, C>,
    pub sequencer: DialerSequencer,
    pub recorder: OutcomeRecorder<S>,
    clock: C,
    identity: Option<String>,
}

impl<'a, S: OutcomeSink, C: Clock + Clone> Workspace<'a, S, C> {
    pub fn new(
        store: &'a Store,
        clock: C,
        settings: ControllerSettings,
        sequencer: DialerSequencer,
        recorder: OutcomeRecorder<S>,
        identity: Option<String>,
    ) -> Self {
        let controller = CallController::new(ManualTelephony::new(), clock.clone(), settings);
        Self {
            store,
            controller,
            sequencer,
            recorder,
            clock,
            identity,
        }
    }
}

pub fn execute_action<S: OutcomeSink, C: Clock>(
    app: &mut App,
    workspace: &mut Workspace<'_, S, C>,
    action: Action,
) -> Result<()> {
    let result = run_action(app, workspace, action);
    absorb_notices(app, workspace)?;
    refresh_view(app, workspace)?;
    result
}

/// Ends the focus session. A call still live at exit is hung up and logged.
pub fn finish<S: OutcomeSink, C: Clock>(
    app: &mut App,
    workspace: &mut Workspace<'_, S, C>,
) -> Result<()> {
    workspace.controller.teardown();
    absorb_notices(app, workspace)
}

fn run_action<S: OutcomeSink, C: Clock>(
    app: &mut App,
    workspace: &mut Workspace<'_, S, C>,
    action: Action,
) -> Result<()> {
    let now = workspace.clock.now_utc();
    match action {
        Action::Refresh => {
            app.pending_count = workspace.store.pending_outcomes().count()?;
        }
        Action::Tick => workspace.controller.pump(),
        Action::PlaceCall => {
            let contact = workspace
                .sequencer
                .current()
                .ok_or_else(|| anyhow!("no contact to call"))?
                .clone();
            let number = contact
                .dial_number()
                .with_context(|| format!("cannot dial {}", contact.display_name))?;
            workspace
                .controller
                .place_call(&number, Some(contact.id.clone()))?;
            app.clear_error();
            app.set_status(format!("Dialing {} at {}", contact.display_name, number));
        }
        Action::HangUp => workspace.controller.hang_up()?,
        Action::Accept => workspace.controller.accept()?,
        Action::Reject => workspace.controller.reject()?,
        Action::ToggleMute => {
            let muted = workspace.controller.toggle_mute()?;
            app.set_status(if muted { "Muted" } else { "Unmuted" });
        }
        Action::SendDigits(digits) => {
            workspace.controller.send_digits(&digits)?;
            app.set_status(format!("Sent {digits}"));
        }
        Action::Reset => {
            workspace.controller.reset()?;
            app.clear_error();
        }
        Action::Reinitialize => {
            let identity = workspace
                .identity
                .clone()
                .ok_or_else(|| anyhow!("caller.id is not configured"))?;
            workspace.controller.initialize(&identity)?;
            app.clear_error();
            app.set_status(format!("Ready as {identity}"));
        }
        Action::Record { label, notes } => {
            match workspace.sequencer.record_current(
                now,
                &workspace.recorder,
                &label,
                notes.as_deref(),
            ) {
                Ok(outcome) => {
                    workspace
                        .store
                        .call_log()
                        .attach_outcome(&outcome.contact_id, &outcome.outcome)?;
                    app.clear_error();
                    app.set_status(format!("Recorded {}. Press 'n' for next", outcome.outcome));
                }
                Err(SequenceError::Record(RecordError::Sink(err))) if err.retryable => {
                    app.set_error(format!(
                        "Outcome not saved: {}. Press 'o' to retry or 'p' to keep it for later",
                        err.reason
                    ));
                }
                Err(SequenceError::Record(RecordError::Sink(err))) => {
                    app.set_error(format!(
                        "Outcome rejected: {}. Press 'o' to pick another or 's' to skip",
                        err.reason
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Action::QueueFailed => {
            let (draft, reason) = match workspace.sequencer.current_step() {
                Some(StepState::Failed { draft, reason }) => (draft.clone(), reason.clone()),
                _ => return Err(anyhow!("no unsaved outcome to keep")),
            };
            workspace
                .store
                .pending_outcomes()
                .enqueue(now, &draft, Some(&reason))?;
            workspace.sequencer.mark_queued()?;
            workspace
                .store
                .call_log()
                .attach_outcome(&draft.contact_id, &draft.outcome)?;
            app.clear_error();
            app.set_status(format!("Kept {} for later delivery", draft.outcome));
        }
        Action::Skip => {
            workspace.sequencer.skip()?;
            app.set_status("Skipped");
        }
        Action::Advance => match workspace.sequencer.advance()? {
            Advanced::Moved { .. } => {
                let name = workspace
                    .sequencer
                    .current()
                    .map(|contact| contact.label())
                    .unwrap_or_default();
                app.clear_error();
                app.set_status(format!("Next: {name}"));
            }
            Advanced::Completed => {
                info!("focus session finished");
                app.clear_error();
                app.set_status("Calling list complete");
            }
        },
        Action::FlushPending => {
            let report = workspace
                .store
                .pending_outcomes()
                .flush(now, workspace.recorder.sink(), None)?;
            app.set_status(format!(
                "Delivered {} pending outcomes",
                report.delivered.len()
            ));
            if let Some((_, reason)) = report.failed.first() {
                app.set_error(format!(
                    "{} still pending: {}",
                    report.failed.len(),
                    reason
                ));
            }
        }
        Action::LoadHistory => {
            app.history = workspace.store.call_log().list(None, HISTORY_LIMIT)?;
        }
        Action::Report(report) => {
            let telephony = workspace.controller.telephony_mut();
            match report {
                Report::Ringing => telephony.report_ringing()?,
                Report::Answered => telephony.report_answered()?,
                Report::RemoteHangUp => telephony.report_remote_hang_up()?,
                Report::Incoming => {
                    let from = workspace
                        .sequencer
                        .current()
                        .and_then(|contact| contact.dial_number().ok())
                        .unwrap_or_else(|| ANONYMOUS_CALLER.to_string());
                    workspace
                        .controller
                        .telephony_mut()
                        .report_incoming(&from)?;
                }
                Report::Error => telephony.report_error("reported by operator"),
            }
            workspace.controller.pump();
        }
    }
    Ok(())
}

fn absorb_notices<S: OutcomeSink, C: Clock>(
    app: &mut App,
    workspace: &mut Workspace<'_, S, C>,
) -> Result<()> {
    for notice in workspace.controller.drain_notices() {
        match notice {
            SessionNotice::StatusChanged { from, to } => {
                debug!(%from, %to, "call status");
            }
            SessionNotice::Tick { elapsed } => app.call.elapsed = elapsed,
            SessionNotice::Error { message } => app.set_error(message),
            SessionNotice::Ignored { trigger, status } => {
                debug!(%trigger, %status, "ignored");
            }
            SessionNotice::IncomingRejectedBusy { from } => {
                app.set_status(format!("Declined call from {from}: line busy"));
            }
            SessionNotice::SessionEnded { session } => {
                workspace.store.call_log().record_session(&session)?;
                if wants_outcome(workspace, &session) {
                    app.prompt_outcome();
                }
            }
        }
    }
    Ok(())
}

/// An outbound call to the current contact ended and nothing is recorded yet.
fn wants_outcome<S: OutcomeSink, C: Clock>(
    workspace: &Workspace<'_, S, C>,
    session: &CallSession,
) -> bool {
    if session.direction() != CallDirection::Outbound {
        return false;
    }
    let current = workspace.sequencer.current().map(|contact| &contact.id);
    session.contact_id().is_some()
        && session.contact_id() == current
        && matches!(workspace.sequencer.current_step(), Some(StepState::Pending))
}

fn refresh_view<S: OutcomeSink, C: Clock>(
    app: &mut App,
    workspace: &Workspace<'_, S, C>,
) -> Result<()> {
    let controller = &workspace.controller;
    let session = controller.session();
    app.queue = QueueDto::from_sequencer(&workspace.sequencer);
    app.call = CallView {
        status: controller.status(),
        direction: session.direction(),
        number: session.target_number().map(str::to_string),
        contact_id: session.contact_id().cloned(),
        elapsed: controller.elapsed_display(),
        muted: session.muted(),
        ready: *controller.readiness() == Readiness::Ready,
        readiness_error: match controller.readiness() {
            Readiness::Failed(reason) => Some(reason.clone()),
            _ => None,
        },
    };
    app.pending_count = workspace.store.pending_outcomes().count()?;
    Ok(())
}
