pub mod client;
pub mod error;
pub mod wire;

pub use client::{BackendClient, ClientOptions};
pub use error::{RemoteError, Result};
