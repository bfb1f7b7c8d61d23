//! # codewatch-mail
//!
//! The push/IDLE event source: a resilient long-lived IMAP connection
//! that turns "something arrived" signals into extracted notifications.
//!
//! - **[`transport`]** -- [`MailTransport`] / [`MailSession`] trait
//!   seam between the watch loop and the wire protocol
//! - **[`imap_transport`]** -- the real IMAP session (TLS, login,
//!   search, fetch, IDLE), blocking client driven from a worker thread
//! - **[`supervisor`]** -- [`ConnectionSupervisor`]: bounded-retry
//!   reconnection with a fixed delay
//! - **[`watcher`]** -- [`IdleWatcher`]: the watch loop (sync, wait,
//!   age, publish)
//!
//! The connection handle is owned by the supervisor and passed
//! explicitly to everything that needs it; there is no ambient/global
//! session state.
//!
//! [`MailTransport`]: transport::MailTransport
//! [`MailSession`]: transport::MailSession
//! [`ConnectionSupervisor`]: supervisor::ConnectionSupervisor
//! [`IdleWatcher`]: watcher::IdleWatcher

pub mod imap_transport;
pub mod supervisor;
pub mod transport;
pub mod watcher;

pub use imap_transport::ImapTransport;
pub use supervisor::ConnectionSupervisor;
pub use transport::{MailSession, MailTransport, WatchSignal};
pub use watcher::IdleWatcher;
