//! Unified error types for offgrid.
//!
//! HTTP error statuses are deliberately absent: a 4xx/5xx response is a
//! valid result and flows through the strategies like any other response.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the caching agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unparsable control message field).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A locator could not be resolved against the scope.
    #[error("INVALID_LOCATOR: {0}")]
    InvalidLocator(String),

    /// Cache store operation failed (quota, IO, closed connection).
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_UNAVAILABLE: migration failed: {0}")]
    MigrationFailed(String),

    /// The network fetch was rejected before producing a response.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// A required shell asset could not be fetched during install.
    #[error("INSTALLATION_INCOMPLETE: {generation}: {reason}")]
    InstallationIncomplete { generation: String, reason: String },

    /// A lifecycle transition was requested from a state that cannot make it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether the error is a store failure that callers may swallow.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::MigrationFailed(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::StoreUnavailable(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::StoreUnavailable(tokio_rusqlite::Error::Close(c)),
            _ => Error::StoreUnavailable(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::StoreUnavailable(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StoreUnavailable(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidLocator(msg) => (-32003, msg.clone()),
            Error::StoreUnavailable(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::NetworkFailure(msg) => (-32008, msg.clone()),
            Error::InstallationIncomplete { .. } => (-32020, err.to_string()),
            Error::InvalidState(msg) => (-32021, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
