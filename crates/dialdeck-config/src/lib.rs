use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dialdeck_core::call::{ControllerSettings, DEFAULT_GRACE_PERIOD};
use dialdeck_core::domain::{default_outcome_labels, OutcomeCatalog, OutcomeLabel};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "dialdeck";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const MAX_GRACE_PERIOD_MS: u64 = 60_000;
pub const MIN_RING_TIMEOUT_SECS: u64 = 5;
pub const MAX_RING_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub caller: CallerConfig,
    pub dialer: DialerConfig,
    pub outcomes: OutcomeCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub api_token_env: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerConfig {
    pub id: Option<String>,
    pub identity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerConfig {
    pub grace_period_ms: u64,
    pub ring_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: None,
                api_token_env: None,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            caller: CallerConfig::default(),
            dialer: DialerConfig {
                grace_period_ms: DEFAULT_GRACE_PERIOD.as_millis() as u64,
                ring_timeout_secs: None,
            },
            outcomes: default_catalog(),
        }
    }
}

impl AppConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            grace_period: self.dialer.grace_period(),
            ring_timeout: self.dialer.ring_timeout(),
            caller_id: self.caller.id.clone(),
        }
    }
}

impl BackendConfig {
    /// Reads the bearer token from the configured environment variable.
    pub fn api_token(&self) -> Option<String> {
        let name = self.api_token_env.as_deref()?;
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CallerConfig {
    /// The registration identity; falls back to the caller id.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref().or(self.id.as_deref())
    }
}

impl DialerConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn ring_timeout(&self) -> Option<Duration> {
        self.ring_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid backend.base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid backend.api_token_env: {0}")]
    InvalidTokenEnv(String),
    #[error("invalid backend.timeout_secs value: {0}")]
    InvalidTimeout(u64),
    #[error("invalid caller.{field}: value must not be blank")]
    BlankCallerField { field: &'static str },
    #[error("invalid dialer.grace_period_ms value: {0}")]
    InvalidGracePeriod(u64),
    #[error("invalid dialer.ring_timeout_secs value: {0}")]
    InvalidRingTimeout(u64),
    #[error("invalid outcomes: {0}")]
    InvalidOutcomes(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    backend: Option<BackendFile>,
    caller: Option<CallerFile>,
    dialer: Option<DialerFile>,
    #[serde(default)]
    outcomes: Vec<OutcomeFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackendFile {
    base_url: Option<String>,
    api_token_env: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CallerFile {
    id: Option<String>,
    identity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DialerFile {
    grace_period_ms: Option<u64>,
    ring_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutcomeFile {
    label: String,
    bg_color: String,
    text_color: String,
    sort_order: Option<i32>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(backend) = parsed.backend {
        if let Some(base_url) = backend.base_url {
            config.backend.base_url = Some(validate_base_url(&base_url)?);
        }
        if let Some(name) = backend.api_token_env {
            config.backend.api_token_env = Some(validate_env_name(&name)?);
        }
        if let Some(timeout) = backend.timeout_secs {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
                return Err(ConfigError::InvalidTimeout(timeout));
            }
            config.backend.timeout_secs = timeout;
        }
    }

    if let Some(caller) = parsed.caller {
        config.caller.id = non_blank(caller.id, "id")?;
        config.caller.identity = non_blank(caller.identity, "identity")?;
    }

    if let Some(dialer) = parsed.dialer {
        if let Some(grace) = dialer.grace_period_ms {
            if grace > MAX_GRACE_PERIOD_MS {
                return Err(ConfigError::InvalidGracePeriod(grace));
            }
            config.dialer.grace_period_ms = grace;
        }
        if let Some(ring) = dialer.ring_timeout_secs {
            if !(MIN_RING_TIMEOUT_SECS..=MAX_RING_TIMEOUT_SECS).contains(&ring) {
                return Err(ConfigError::InvalidRingTimeout(ring));
            }
            config.dialer.ring_timeout_secs = Some(ring);
        }
    }

    if !parsed.outcomes.is_empty() {
        let labels = parsed
            .outcomes
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                OutcomeLabel::new(
                    &item.label,
                    &item.bg_color,
                    &item.text_color,
                    item.sort_order.unwrap_or(index as i32),
                )
            })
            .collect::<Vec<_>>();
        for label in &labels {
            label
                .validate_colors()
                .map_err(|err| ConfigError::InvalidOutcomes(err.to_string()))?;
        }
        config.outcomes = OutcomeCatalog::new(labels)
            .map_err(|err| ConfigError::InvalidOutcomes(err.to_string()))?;
    }

    Ok(config)
}

fn default_catalog() -> OutcomeCatalog {
    OutcomeCatalog::new(default_outcome_labels()).unwrap_or_default()
}

fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_scheme = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    if !has_scheme || trimmed.len() <= "https://".len() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_env_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && !trimmed.starts_with(|ch: char| ch.is_ascii_digit())
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(ConfigError::InvalidTokenEnv(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>, field: &'static str) -> Result<Option<String>> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ConfigError::BlankCallerField { field }),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        load_at_path, merge_config, AppConfig, BackendFile, ConfigError, ConfigFile, DialerFile,
        OutcomeFile,
    };
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    #[test]
    fn defaults_cover_dialer_and_catalog() {
        let config = AppConfig::default();
        assert_eq!(config.dialer.grace_period(), Duration::from_secs(2));
        assert_eq!(config.dialer.ring_timeout(), None);
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.outcomes.find("No Answer").is_some());
    }

    #[test]
    fn merge_config_applies_values() {
        let parsed = ConfigFile {
            backend: Some(BackendFile {
                base_url: Some("https://crm.example.com/api/".to_string()),
                api_token_env: Some("DIALDECK_TOKEN".to_string()),
                timeout_secs: Some(10),
            }),
            dialer: Some(DialerFile {
                grace_period_ms: Some(1500),
                ring_timeout_secs: Some(45),
            }),
            ..Default::default()
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(
            merged.backend.base_url.as_deref(),
            Some("https://crm.example.com/api")
        );
        assert_eq!(merged.backend.api_token_env.as_deref(), Some("DIALDECK_TOKEN"));
        let settings = merged.controller_settings();
        assert_eq!(settings.grace_period, Duration::from_millis(1500));
        assert_eq!(settings.ring_timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn merge_config_rejects_bad_ring_timeout() {
        let parsed = ConfigFile {
            dialer: Some(DialerFile {
                grace_period_ms: None,
                ring_timeout_secs: Some(1),
            }),
            ..Default::default()
        };
        assert!(matches!(
            merge_config(parsed),
            Err(ConfigError::InvalidRingTimeout(1))
        ));
    }

    #[test]
    fn merge_config_rejects_duplicate_outcomes() {
        let outcome = |label: &str| OutcomeFile {
            label: label.to_string(),
            bg_color: "#fff".to_string(),
            text_color: "#000".to_string(),
            sort_order: None,
        };
        let parsed = ConfigFile {
            outcomes: vec![outcome("Booked"), outcome("booked")],
            ..Default::default()
        };
        assert!(matches!(
            merge_config(parsed),
            Err(ConfigError::InvalidOutcomes(_))
        ));
    }

    #[test]
    fn merge_config_rejects_non_hex_outcome_colors() {
        let parsed = ConfigFile {
            outcomes: vec![OutcomeFile {
                label: "Booked".to_string(),
                bg_color: "green".to_string(),
                text_color: "#fff".to_string(),
                sort_order: None,
            }],
            ..Default::default()
        };
        assert!(matches!(
            merge_config(parsed),
            Err(ConfigError::InvalidOutcomes(message)) if message.contains("green")
        ));
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config file not found"));
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r##"
[backend]
base_url = "http://127.0.0.1:8080"

[caller]
id = "agent-7"

[[outcomes]]
label = "Booked"
bg_color = "#16a34a"
text_color = "#ffffff"

[[outcomes]]
label = "Not Now"
bg_color = "#e5e7eb"
text_color = "#111827"
"##,
        )
        .expect("write config");
        restrict_permissions(&path);

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.caller.identity(), Some("agent-7"));
        let labels: Vec<&str> = config
            .outcomes
            .labels()
            .iter()
            .map(|label| label.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Booked", "Not Now"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[dialer]\nauto_dial = true\n").expect("write config");
        restrict_permissions(&path);
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn world_readable_config_is_refused() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "").expect("write config");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).expect("chmod");
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::InsecurePermissions(_))
        ));
    }
}
