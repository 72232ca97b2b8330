//! Error types for openLCA IPC operations.

use thiserror::Error;

/// Failure taxonomy for every operation in this crate.
///
/// No variant is ever retried automatically: `data/put` creates new
/// entities, so a blind retry could duplicate data.
#[derive(Debug, Error)]
pub enum OlcaError {
    /// The IPC endpoint is unreachable or the handshake failed.
    /// Fatal to the session; surfaced immediately.
    #[error("connection to openLCA IPC endpoint failed: {0}")]
    Connection(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required entity could not be located in the remote store.
    /// Plain searches return empty results instead of this.
    #[error("{0} not found")]
    NotFound(String),

    /// The server rejected or failed a calculation or put. Almost
    /// always a data-validity problem the caller must fix.
    #[error("remote computation failed: {message} (code {code})")]
    Remote { code: i64, message: String },

    /// A disposal or lookup referenced an unknown/expired result key.
    #[error("Result {0} not found")]
    HandleNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
