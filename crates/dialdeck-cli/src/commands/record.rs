use crate::commands::{print_json, Context};
use crate::util::parse_contact_id;
use anyhow::{Context as _, Result};
use clap::Args;
use dialdeck_core::dialer::{OutcomeRecorder, RecordError};
use dialdeck_core::dto::{CallOutcomeDto, PendingOutcomeDto};
use dialdeck_core::time::now_utc;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub contact: String,
    #[arg(long)]
    pub outcome: String,
    #[arg(long)]
    pub notes: Option<String>,
    /// Overrides caller.id from the config
    #[arg(long)]
    pub caller_id: Option<String>,
    /// Fail instead of queuing the outcome when the backend is unreachable.
    /// Outcomes the backend rejects outright are never queued
    #[arg(long)]
    pub no_queue: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RecordResultDto {
    Recorded { outcome: CallOutcomeDto },
    Queued { pending: PendingOutcomeDto },
}

pub fn record_outcome(ctx: &Context<'_>, args: RecordArgs) -> Result<()> {
    let contact_id = parse_contact_id(&args.contact)?;
    let caller_id = args
        .caller_id
        .or_else(|| ctx.config.caller.id.clone())
        .unwrap_or_default();
    let recorder = OutcomeRecorder::new(ctx.backend()?, ctx.outcome_catalog()?, caller_id);

    let now = now_utc();
    let draft = recorder.draft(now, &contact_id, &args.outcome, args.notes.as_deref())?;
    let result = match recorder.record_draft(now, &draft) {
        Ok(outcome) => RecordResultDto::Recorded {
            outcome: CallOutcomeDto::from(&outcome),
        },
        Err(RecordError::Sink(err)) if err.retryable && !args.no_queue => {
            warn!(contact = %contact_id, error = %err, "queuing outcome for later delivery");
            let pending = ctx
                .store
                .pending_outcomes()
                .enqueue(now, &draft, Some(err.reason.as_str()))
                .with_context(|| "queue outcome")?;
            RecordResultDto::Queued {
                pending: pending.to_dto(),
            }
        }
        Err(err) => return Err(err).with_context(|| format!("record outcome for {contact_id}")),
    };
    ctx.store
        .call_log()
        .attach_outcome(&contact_id, &draft.outcome)
        .with_context(|| "update call history")?;

    if ctx.json {
        return print_json(&result);
    }
    match result {
        RecordResultDto::Recorded { outcome } => {
            println!("recorded {} for {}", outcome.outcome, outcome.contact_id)
        }
        RecordResultDto::Queued { pending } => println!(
            "backend unavailable ({}); {} for {} queued as {}",
            pending.last_error.as_deref().unwrap_or("unknown error"),
            pending.outcome,
            pending.contact_id,
            pending.id
        ),
    }
    Ok(())
}
