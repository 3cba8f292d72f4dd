use dialdeck_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("backend base url is not configured")]
    NotConfigured,
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("backend url must use https: {0}")]
    InsecureUrl(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl RemoteError {
    /// Whether sending the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
