use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Defaults to caller.identity, then caller.id
    #[arg(long)]
    pub identity: Option<String>,
}

pub fn fetch_token(ctx: &Context<'_>, args: TokenArgs) -> Result<()> {
    let identity = args
        .identity
        .as_deref()
        .or(ctx.config.caller.identity())
        .map(str::trim)
        .filter(|identity| !identity.is_empty())
        .ok_or_else(|| invalid_input("no identity: pass --identity or set caller.id"))?
        .to_string();
    let token = ctx
        .backend()?
        .telephony_token(&identity)
        .with_context(|| "fetch telephony token")?;

    if ctx.json {
        print_json(&serde_json::json!({ "identity": identity, "token": token }))
    } else {
        println!("{token}");
        Ok(())
    }
}
