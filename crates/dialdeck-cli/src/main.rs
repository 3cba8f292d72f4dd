mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{
    completions, focus, history, outcomes, pending, queue, record, token, Context,
};
use crate::error::{exit_code_for, report_error};
use dialdeck_config as config;
use dialdeck_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "dialdeck", version, about = "dialdeck CLI")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
    /// Open the focus dialer
    Focus(focus::FocusArgs),
    /// Show the calling list
    Queue(queue::QueueArgs),
    /// Record the outcome of a call
    Record(record::RecordArgs),
    #[command(subcommand)]
    Outcomes(outcomes::OutcomesCommand),
    #[command(subcommand)]
    Pending(pending::PendingCommand),
    /// Show recent calls
    History(history::HistoryArgs),
    /// Fetch a telephony access token
    Token(token::TokenArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    match command {
        Command::Focus(args) => focus::launch(db_path, config_path, args, verbose),
        Command::Completions(args) => completions::emit(args),
        command => {
            let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
            if verbose {
                match config::resolve_config_path(config_path.clone()) {
                    Ok(path) => {
                        if path.exists() {
                            debug!(path = %path.display(), "config resolved");
                        } else {
                            debug!(path = %path.display(), "config missing, using defaults");
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "config unavailable");
                    }
                }
            }
            let db_path =
                paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
            if verbose {
                debug!(path = %db_path.display(), "database path resolved");
            }

            let store = Store::open(&db_path)
                .with_context(|| format!("open database {}", db_path.display()))?;
            store.migrate().with_context(|| "run migrations")?;

            let ctx = Context {
                store: &store,
                json,
                config: &app_config,
            };

            match command {
                Command::Queue(args) => queue::show_queue(&ctx, args),
                Command::Record(args) => record::record_outcome(&ctx, args),
                Command::Outcomes(cmd) => match cmd {
                    outcomes::OutcomesCommand::Ls(args) => outcomes::list_outcomes(&ctx, args),
                    outcomes::OutcomesCommand::Pull(args) => outcomes::pull_outcomes(&ctx, args),
                    outcomes::OutcomesCommand::Push(args) => outcomes::push_outcomes(&ctx, args),
                },
                Command::Pending(cmd) => match cmd {
                    pending::PendingCommand::Ls(args) => pending::list_pending(&ctx, args),
                    pending::PendingCommand::Flush(args) => pending::flush_pending(&ctx, args),
                    pending::PendingCommand::Drop(args) => pending::drop_pending(&ctx, args),
                },
                Command::History(args) => history::show_history(&ctx, args),
                Command::Token(args) => token::fetch_token(&ctx, args),
                Command::Focus(_) => {
                    unreachable!("focus command handled before store initialization")
                }
                Command::Completions(_) => {
                    unreachable!("completions command handled before store initialization")
                }
            }
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
