//! Mail transport trait seam.
//!
//! [`MailTransport`] makes one connection attempt; [`MailSession`] is a
//! live, logged-in, folder-selected connection. The watch loop and the
//! supervisor are written against these traits, so the whole failure /
//! reconnect / dedup behavior is testable with scripted in-memory
//! sessions.

use std::time::Duration;

use async_trait::async_trait;

use codewatch_types::MailError;

/// Why a [`MailSession::wait_for_update`] call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    /// The server signalled new activity in the watched folder.
    Changed,
    /// The wait interval elapsed with no server activity.
    TimedOut,
}

/// One connection attempt: connect, authenticate, select the folder.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Establish a live session or fail with a transport error.
    async fn connect(&self) -> Result<Box<dyn MailSession>, MailError>;
}

/// A live mail session.
///
/// Methods take `&mut self`: a session is owned by exactly one watch
/// loop and is never shared.
#[async_trait]
pub trait MailSession: Send {
    /// Sequence numbers of messages from `sender` in the selected
    /// folder, ascending (oldest first).
    async fn search_from(&mut self, sender: &str) -> Result<Vec<u32>, MailError>;

    /// Fetch the full RFC 822 text of one message.
    async fn fetch(&mut self, seq: u32) -> Result<String, MailError>;

    /// Block until the server signals folder activity or `timeout`
    /// elapses. The single suspension point of the watch loop.
    async fn wait_for_update(&mut self, timeout: Duration) -> Result<WatchSignal, MailError>;

    /// Close the session politely. Best-effort; the session is dropped
    /// afterwards either way.
    async fn close(&mut self) -> Result<(), MailError>;
}
