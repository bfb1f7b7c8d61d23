//! Service-layer error type.

use thiserror::Error;

/// Errors from the webhook-variant services (history API, cursor
/// persistence).
///
/// Everything here is recoverable from the engine's point of view: a
/// failed history fetch is retried on the next push (at-least-once
/// delivery), and a failed cursor write only means the next push
/// recomputes from the last known-good marker.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServiceError {
    /// Transport-level HTTP failure talking to the history API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The history API answered with a non-success status.
    #[error("api error: status {status}")]
    Api {
        /// HTTP status code returned.
        status: u16,
    },

    /// Cursor file could not be read or written.
    #[error("cursor io error: {0}")]
    CursorIo(#[from] std::io::Error),

    /// A response body did not parse.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
