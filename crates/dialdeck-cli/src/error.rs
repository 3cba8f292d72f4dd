use anyhow::Error;
use dialdeck_config::ConfigError;
use dialdeck_core::dialer::{RecordError, SequenceError};
use dialdeck_core::CoreError;
use dialdeck_remote::RemoteError;
use dialdeck_store::error::{StoreError, StoreErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_found(message: impl Into<String>) -> Error {
    CliError::NotFound(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotFound(_) => EXIT_NOT_FOUND,
            });
        }
        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            return ExitCode::from(store_exit_code(store_err));
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if let Some(remote_err) = cause.downcast_ref::<RemoteError>() {
            return ExitCode::from(remote_exit_code(remote_err));
        }
        if let Some(record_err) = cause.downcast_ref::<RecordError>() {
            return ExitCode::from(record_exit_code(record_err));
        }
        if let Some(sequence_err) = cause.downcast_ref::<SequenceError>() {
            return ExitCode::from(match sequence_err {
                SequenceError::NotFound(_) => EXIT_NOT_FOUND,
                SequenceError::Record(err) => record_exit_code(err),
                _ => EXIT_INVALID_INPUT,
            });
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn store_exit_code(err: &StoreError) -> u8 {
    match err.kind() {
        StoreErrorKind::NotFound => EXIT_NOT_FOUND,
        StoreErrorKind::InvalidId | StoreErrorKind::InvalidDataPath | StoreErrorKind::Core => {
            EXIT_INVALID_INPUT
        }
        StoreErrorKind::MissingHomeDir
        | StoreErrorKind::Migration
        | StoreErrorKind::InvalidColumn
        | StoreErrorKind::Sql
        | StoreErrorKind::Io => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidBaseUrl(_)
        | ConfigError::InvalidTokenEnv(_)
        | ConfigError::InvalidTimeout(_)
        | ConfigError::BlankCallerField { .. }
        | ConfigError::InvalidGracePeriod(_)
        | ConfigError::InvalidRingTimeout(_)
        | ConfigError::InvalidOutcomes(_)
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn remote_exit_code(err: &RemoteError) -> u8 {
    match err {
        RemoteError::NotConfigured | RemoteError::Url(_) | RemoteError::InsecureUrl(_) => {
            EXIT_INVALID_INPUT
        }
        RemoteError::Status { status: 404, .. } => EXIT_NOT_FOUND,
        RemoteError::Core(_) => EXIT_INVALID_INPUT,
        RemoteError::Status { .. } | RemoteError::Http(_) | RemoteError::Decode(_) => EXIT_FAILURE,
    }
}

fn record_exit_code(err: &RecordError) -> u8 {
    match err {
        RecordError::Sink(_) => EXIT_FAILURE,
        RecordError::UnknownOutcome(_)
        | RecordError::MissingCallerId
        | RecordError::NotesTooLong(_) => EXIT_INVALID_INPUT,
    }
}
