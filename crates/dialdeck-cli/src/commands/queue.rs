use crate::commands::{print_json, Context};
use crate::error::not_found;
use crate::util::{or_dash, parse_contact_id};
use anyhow::{Context as _, Result};
use clap::Args;
use dialdeck_core::dialer::{DialerQueue, DialerSequencer};
use dialdeck_core::dto::QueueDto;

#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Start the list at this contact
    #[arg(long)]
    pub contact: Option<String>,
}

pub fn show_queue(ctx: &Context<'_>, args: QueueArgs) -> Result<()> {
    let contact_id = args.contact.as_deref().map(parse_contact_id).transpose()?;
    let client = ctx.backend()?;
    let contacts = client
        .calling_list(contact_id.as_ref())
        .with_context(|| "fetch calling list")?;

    let mut sequencer = DialerSequencer::new(DialerQueue::new(contacts));
    if let Some(contact_id) = &contact_id {
        sequencer
            .jump_to(contact_id)
            .map_err(|_| not_found(format!("contact {contact_id} is not on the calling list")))?;
    }
    let queue = QueueDto::from_sequencer(&sequencer);

    if ctx.json {
        return print_json(&queue);
    }
    if queue.items.is_empty() {
        println!("calling list is empty");
        return Ok(());
    }
    for item in &queue.items {
        let marker = if item.position == queue.cursor { ">" } else { " " };
        let company = item
            .company
            .as_deref()
            .map(|company| format!(" ({company})"))
            .unwrap_or_default();
        println!(
            "{marker}{:>3}  {:<12} {}{}  {}",
            item.position + 1,
            item.id,
            item.display_name,
            company,
            or_dash(item.dial_number.as_deref())
        );
    }
    Ok(())
}
