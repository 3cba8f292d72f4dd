use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{format_optional_timestamp, or_dash};
use anyhow::{anyhow, Context as _, Result};
use clap::{Args, Subcommand};
use dialdeck_core::domain::OutcomeId;
use dialdeck_core::dto::PendingOutcomeDto;
use dialdeck_core::time::{format_timestamp_datetime, now_utc};
use std::str::FromStr;

#[derive(Debug, Subcommand)]
pub enum PendingCommand {
    /// List outcomes waiting for delivery
    Ls(PendingListArgs),
    /// Resend queued outcomes, oldest first
    Flush(PendingFlushArgs),
    /// Discard a queued outcome without sending it
    Drop(PendingDropArgs),
}

#[derive(Debug, Args)]
pub struct PendingListArgs {}

#[derive(Debug, Args)]
pub struct PendingFlushArgs {
    #[arg(long)]
    pub limit: Option<i64>,
}

#[derive(Debug, Args)]
pub struct PendingDropArgs {
    pub id: String,
}

pub fn list_pending(ctx: &Context<'_>, _args: PendingListArgs) -> Result<()> {
    let items: Vec<PendingOutcomeDto> = ctx
        .store
        .pending_outcomes()
        .list(None)?
        .iter()
        .map(|pending| pending.to_dto())
        .collect();

    if ctx.json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("no pending outcomes");
        return Ok(());
    }
    for item in items {
        println!(
            "{}  {}  {:<16} queued {}  attempts {}  last try {}  {}",
            item.id,
            item.contact_id,
            item.outcome,
            format_timestamp_datetime(item.queued_at),
            item.attempts,
            format_optional_timestamp(item.last_attempt_at),
            or_dash(item.last_error.as_deref())
        );
    }
    Ok(())
}

pub fn flush_pending(ctx: &Context<'_>, args: PendingFlushArgs) -> Result<()> {
    if let Some(limit) = args.limit {
        if limit <= 0 {
            return Err(invalid_input("limit must be positive"));
        }
    }
    let client = ctx.backend()?;
    let report = ctx
        .store
        .pending_outcomes()
        .flush(now_utc(), &client, args.limit)
        .with_context(|| "flush pending outcomes")?;

    if ctx.json {
        print_json(&serde_json::json!({
            "delivered": report.delivered,
            "failed": report
                .failed
                .iter()
                .map(|(id, reason)| serde_json::json!({ "id": id, "error": reason }))
                .collect::<Vec<_>>(),
        }))?;
    } else {
        println!("delivered {} pending outcomes", report.delivered.len());
        for (id, reason) in &report.failed {
            println!("still pending {id}: {reason}");
        }
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{} outcomes could not be delivered", report.failed.len()))
    }
}

pub fn drop_pending(ctx: &Context<'_>, args: PendingDropArgs) -> Result<()> {
    let id = OutcomeId::from_str(args.id.trim())
        .map_err(|_| invalid_input(format!("invalid outcome id: {}", args.id)))?;
    ctx.store.pending_outcomes().remove(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id, "dropped": true }))?;
    } else {
        println!("dropped pending outcome {id}");
    }
    Ok(())
}
