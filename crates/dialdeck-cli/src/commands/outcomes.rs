use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use dialdeck_core::domain::OutcomeCatalog;
use dialdeck_core::time::now_utc;

#[derive(Debug, Subcommand)]
pub enum OutcomesCommand {
    /// List the outcome labels in use
    Ls(OutcomesListArgs),
    /// Fetch the catalog from the backend and cache it
    Pull(OutcomesPullArgs),
    /// Replace the backend catalog with the configured one
    Push(OutcomesPushArgs),
}

#[derive(Debug, Args)]
pub struct OutcomesListArgs {}

#[derive(Debug, Args)]
pub struct OutcomesPullArgs {}

#[derive(Debug, Args)]
pub struct OutcomesPushArgs {}

pub fn list_outcomes(ctx: &Context<'_>, _args: OutcomesListArgs) -> Result<()> {
    let catalog = ctx.outcome_catalog()?;
    print_catalog(ctx, &catalog)
}

pub fn pull_outcomes(ctx: &Context<'_>, _args: OutcomesPullArgs) -> Result<()> {
    let catalog = ctx
        .backend()?
        .outcome_labels()
        .with_context(|| "fetch outcome catalog")?;
    ctx.store
        .outcome_labels()
        .replace_all(now_utc(), &catalog)
        .with_context(|| "cache outcome catalog")?;
    if !ctx.json {
        println!("fetched {} outcome labels", catalog.len());
    }
    print_catalog(ctx, &catalog)
}

pub fn push_outcomes(ctx: &Context<'_>, _args: OutcomesPushArgs) -> Result<()> {
    let catalog = &ctx.config.outcomes;
    ctx.backend()?
        .update_outcome_labels(catalog)
        .with_context(|| "update outcome catalog")?;
    ctx.store
        .outcome_labels()
        .replace_all(now_utc(), catalog)
        .with_context(|| "cache outcome catalog")?;
    if ctx.json {
        return print_json(catalog);
    }
    println!("pushed {} outcome labels", catalog.len());
    Ok(())
}

fn print_catalog(ctx: &Context<'_>, catalog: &OutcomeCatalog) -> Result<()> {
    if ctx.json {
        return print_json(catalog);
    }
    for label in catalog.labels() {
        println!(
            "{:>3}  {:<20} {} on {}",
            label.sort_order, label.label, label.text_color, label.bg_color
        );
    }
    Ok(())
}
