use crate::commands::{print_json, Context, DEFAULT_HISTORY_LIMIT};
use crate::error::invalid_input;
use crate::util::{format_optional_timestamp, or_dash, parse_contact_id};
use anyhow::Result;
use clap::Args;
use dialdeck_core::time::{format_elapsed, format_timestamp_datetime};
use std::time::Duration;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: i64,
}

pub fn show_history(ctx: &Context<'_>, args: HistoryArgs) -> Result<()> {
    if args.limit <= 0 {
        return Err(invalid_input("limit must be positive"));
    }
    let contact_id = args.contact.as_deref().map(parse_contact_id).transpose()?;
    let entries = ctx.store.call_log().list(contact_id.as_ref(), args.limit)?;

    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("no calls yet");
        return Ok(());
    }
    for entry in entries {
        let talk = format_elapsed(Duration::from_secs(entry.duration_secs.max(0) as u64));
        let contact = entry
            .contact_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<8} {:<12} {:<14} {:<12} {}  answered {}  {}",
            format_timestamp_datetime(entry.ended_at),
            entry.direction,
            contact,
            entry.number,
            entry.final_status,
            talk,
            format_optional_timestamp(entry.started_at),
            or_dash(entry.outcome.as_deref().or(entry.failure.as_deref()))
        );
    }
    Ok(())
}
