mod actions;
mod app;
mod telephony;
mod ui;
mod util;

use std::fs::{File, OpenOptions};
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::actions::{execute_action, finish, Action, Workspace};
use crate::app::App;
use dialdeck_config::{self as config, AppConfig};
use dialdeck_core::dialer::{DialerQueue, DialerSequencer, OutcomeRecorder, OutcomeSink};
use dialdeck_core::domain::{ContactId, OutcomeCatalog};
use dialdeck_core::time::{now_utc, Clock, SystemClock};
use dialdeck_remote::{BackendClient, ClientOptions, RemoteError};
use dialdeck_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "dialdeck-tui", version, about = "dialdeck focus dialer")]
struct Args {
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Open the calling list at this contact
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, args.verbose)?;
    }

    let app_config = config::load(args.config.clone()).with_context(|| "load config")?;
    let db_path = paths::resolve_db_path(args.db_path).with_context(|| "resolve database path")?;
    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let client = backend_client(&app_config)?;
    let contact_id = args
        .contact
        .as_deref()
        .map(ContactId::new)
        .transpose()
        .with_context(|| "parse --contact")?;
    let contacts = client
        .calling_list(contact_id.as_ref())
        .with_context(|| "fetch calling list")?;
    let catalog = load_catalog(&client, &store, &app_config);

    let mut app = App::new(catalog.labels().to_vec());
    let mut sequencer = DialerSequencer::new(DialerQueue::new(contacts));
    if let Some(contact_id) = &contact_id {
        if let Err(err) = sequencer.jump_to(contact_id) {
            app.set_error(err.to_string());
        }
    }
    let caller_id = app_config.caller.id.clone().unwrap_or_default();
    let recorder = OutcomeRecorder::new(client, catalog, caller_id);
    let mut workspace = Workspace::new(
        &store,
        SystemClock,
        app_config.controller_settings(),
        sequencer,
        recorder,
        app_config.caller.identity().map(str::to_string),
    );
    app.enqueue(Action::Reinitialize);
    info!(contacts = workspace.sequencer.queue().len(), "focus session started");

    let mut terminal = TerminalGuard::new()?;
    let result = run_app(&mut terminal, &mut workspace, &mut app);
    if let Err(err) = finish(&mut app, &mut workspace) {
        warn!(error = %err, "could not log the last call");
    }
    result
}

fn run_app<S: OutcomeSink, C: Clock>(
    terminal: &mut TerminalGuard,
    workspace: &mut Workspace<'_, S, C>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        app.enqueue(Action::Tick);
        while let Some(action) = app.next_action() {
            if let Err(err) = execute_action(app, workspace, action) {
                app.set_error(err.to_string());
            }
        }

        terminal.terminal_mut().draw(|frame| ui::draw(frame, app))?;

        if app.should_quit {
            break;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::from_secs(0));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn backend_client(app_config: &AppConfig) -> Result<BackendClient> {
    let base_url = app_config
        .backend
        .base_url
        .clone()
        .ok_or(RemoteError::NotConfigured)?;
    let mut options = ClientOptions::new(base_url);
    options.api_token = app_config.backend.api_token();
    options.timeout = app_config.backend.timeout();
    options.user_agent = Some(format!("dialdeck-tui/{}", env!("CARGO_PKG_VERSION")));
    Ok(BackendClient::new(options)?)
}

/// Backend catalog when reachable (and cached for offline runs), otherwise the
/// last cached one, otherwise the configured one.
fn load_catalog(client: &BackendClient, store: &Store, app_config: &AppConfig) -> OutcomeCatalog {
    match client.outcome_labels() {
        Ok(catalog) => {
            if let Err(err) = store.outcome_labels().replace_all(now_utc(), &catalog) {
                warn!(error = %err, "could not cache outcome catalog");
            }
            return catalog;
        }
        Err(err) => warn!(error = %err, "outcome catalog unavailable, using local copy"),
    }
    match store.outcome_labels().catalog() {
        Ok(Some(catalog)) => catalog,
        Ok(None) => app_config.outcomes.clone(),
        Err(err) => {
            warn!(error = %err, "cached outcome catalog unreadable");
            app_config.outcomes.clone()
        }
    }
}

fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("install logger: {err}"))
}

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore_terminal();
            original_hook(info);
        }));

        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}
