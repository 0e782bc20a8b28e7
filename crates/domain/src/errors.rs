//! Error types used throughout the sync client

use std::time::Duration;

use thiserror::Error;

use crate::impl_wire_name_conversions;

/// Coarse classification of a [`SyncError`].
///
/// Logs and the runner report these via [`ErrorKind::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Login or refresh rejected, or its response undecodable
    Auth,
    /// Network or connection failure, including deadlines
    Transport,
    /// Malformed response body
    Decode,
    /// Target list absent from the fetched snapshot
    NotFound,
    /// Non-2xx response from the mutation endpoint
    Mutation,
    /// Aborted by the owning cancellation token
    Cancelled,
    /// Invalid local configuration
    Config,
}

impl_wire_name_conversions!(ErrorKind {
    Auth => "auth",
    Transport => "transport",
    Decode => "decode",
    NotFound => "not_found",
    Mutation => "mutation",
    Cancelled => "cancelled",
    Config => "config",
});

impl ErrorKind {
    /// Stable label suitable for structured logging.
    pub const fn label(self) -> &'static str {
        self.as_str()
    }
}

/// Main error type for the sync client
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Mutation rejected with status {status}: {message}")]
    Mutation { status: u16, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Get the classification for this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Transport(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Mutation { .. } => ErrorKind::Mutation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for sync client operations
pub type Result<T> = std::result::Result<T, SyncError>;
