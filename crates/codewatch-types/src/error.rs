//! Error types for codewatch.
//!
//! Provides [`CodewatchError`] as the top-level error type and
//! [`MailError`] for mail-transport failures. Both are non-exhaustive
//! to allow future extension without breaking downstream.

use thiserror::Error;

/// Top-level error type for codewatch.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodewatchError {
    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A mail-layer error bubbled up.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mail-transport error type.
///
/// Used by the IMAP transport and the connection supervisor to report
/// failures in connecting, authenticating, or exchanging data with the
/// mail server. Every variant except [`RetriesExhausted`] is transient
/// from the watcher's point of view: the supervisor reconnects and the
/// next sync pass re-derives state.
///
/// [`RetriesExhausted`]: MailError::RetriesExhausted
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MailError {
    /// Failed to establish a connection to the mail server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication / authorization was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server aborted or violated the protocol mid-session.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A requested message could not be fetched.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// The reconnection budget is spent. Fatal for the watcher: the
    /// caller must surface this to the operator rather than retry.
    #[error("reconnection budget exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// How many connection attempts were made.
        attempts: u32,
    },

    /// The watcher was cancelled while waiting or reconnecting.
    #[error("cancelled")]
    Cancelled,
}

/// Convenience alias for results with [`CodewatchError`].
pub type Result<T> = std::result::Result<T, CodewatchError>;
