use anyhow::{Context as _, Result};
use dialdeck_config::AppConfig;
use dialdeck_core::domain::OutcomeCatalog;
use dialdeck_remote::{BackendClient, ClientOptions, RemoteError};
use dialdeck_store::Store;
use serde::Serialize;
use std::io::{self, Write};

pub mod completions;
pub mod focus;
pub mod history;
pub mod outcomes;
pub mod pending;
pub mod queue;
pub mod record;
pub mod token;

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

impl Context<'_> {
    pub fn backend(&self) -> Result<BackendClient> {
        backend_client(self.config)
    }

    /// The cached backend catalog when there is one, otherwise the configured one.
    pub fn outcome_catalog(&self) -> Result<OutcomeCatalog> {
        let cached = self
            .store
            .outcome_labels()
            .catalog()
            .with_context(|| "load cached outcome catalog")?;
        Ok(cached.unwrap_or_else(|| self.config.outcomes.clone()))
    }
}

pub fn backend_client(config: &AppConfig) -> Result<BackendClient> {
    let base_url = config
        .backend
        .base_url
        .clone()
        .ok_or(RemoteError::NotConfigured)?;
    let mut options = ClientOptions::new(base_url);
    options.api_token = config.backend.api_token();
    options.timeout = config.backend.timeout();
    options.user_agent = Some(format!("dialdeck/{}", env!("CARGO_PKG_VERSION")));
    Ok(BackendClient::new(options)?)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
