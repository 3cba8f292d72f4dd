use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use dialdeck_store::paths;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::util::parse_contact_id;

#[derive(Debug, Args)]
pub struct FocusArgs {
    /// Open the calling list at this contact
    #[arg(long)]
    pub contact: Option<String>,
    /// Write diagnostics here instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub fn launch(
    db_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    args: FocusArgs,
    verbose: bool,
) -> Result<()> {
    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    if verbose {
        eprintln!("db: {}", db_path.display());
    }
    let mut command = build_command(&db_path, config_path, args, verbose)?;

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = command.exec();
        Err(exec_error(err))
    }

    #[cfg(not(unix))]
    {
        let status = command.status().with_context(|| "launch dialdeck-tui")?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

fn build_command(
    db_path: &Path,
    config_path: Option<PathBuf>,
    args: FocusArgs,
    verbose: bool,
) -> Result<Command> {
    let mut command = Command::new(find_tui_binary());
    command.arg("--db-path").arg(db_path);
    if let Some(path) = config_path {
        command.arg("--config").arg(path);
    }
    if let Some(raw) = args.contact.as_deref() {
        let contact_id = parse_contact_id(raw)?;
        command.arg("--contact").arg(contact_id.as_str());
    }
    if let Some(path) = args.log_file {
        command.arg("--log-file").arg(path);
    }
    if verbose {
        command.arg("--verbose");
    }
    Ok(command)
}

fn find_tui_binary() -> PathBuf {
    let name = format!("dialdeck-tui{}", env::consts::EXE_SUFFIX);
    if let Ok(current) = env::current_exe() {
        if let Some(dir) = current.parent() {
            let candidate = dir.join(&name);
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    PathBuf::from(name)
}

fn exec_error(err: std::io::Error) -> anyhow::Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        return anyhow!(
            "dialdeck-tui binary not found; build it with `cargo build -p dialdeck-tui` or install the package"
        );
    }
    anyhow!("launch dialdeck-tui failed: {}", err)
}
