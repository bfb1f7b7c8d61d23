//! # codewatch-types
//!
//! Core type definitions for the codewatch inbox watcher.
//!
//! This crate is the foundation of the dependency graph -- the engine,
//! mail, service, and CLI crates all depend on it. It contains:
//!
//! - **[`notification`]** -- [`Notification`], [`AgeBucket`], and the
//!   [`Snapshot`] delivered to display consumers
//! - **[`config`]** -- Configuration schema for the store, mailbox,
//!   reconnect policy, and webhook endpoint
//! - **[`error`]** -- [`CodewatchError`] and [`MailError`] error types
//! - **[`secret`]** -- [`SecretString`] credential wrapper
//!
//! [`Notification`]: notification::Notification
//! [`AgeBucket`]: notification::AgeBucket
//! [`Snapshot`]: notification::Snapshot
//! [`CodewatchError`]: error::CodewatchError
//! [`MailError`]: error::MailError
//! [`SecretString`]: secret::SecretString

pub mod config;
pub mod error;
pub mod notification;
pub mod secret;

pub use error::{CodewatchError, MailError, Result};
pub use notification::{AgeBucket, Notification, Snapshot};
