//! # codewatch-services
//!
//! The webhook/cursor event source: an HTTP push endpoint, an
//! incremental history client, durable cursor bookkeeping, and the
//! engine task that ties them to the notification store.
//!
//! - **[`push`]** -- `POST /pubsub/push` boundary; envelope parsing and
//!   rejection
//! - **[`history`]** -- [`HistoryClient`] seam and its REST
//!   implementation
//! - **[`cursor`]** -- [`CursorStore`] seam and the atomic file store
//! - **[`engine`]** -- [`WebhookEngine`]: single-writer loop over push
//!   markers and aging ticks
//! - **[`error`]** -- [`ServiceError`]
//!
//! Delivery contract is at-least-once: an unwritten cursor or a dropped
//! push signal means the next push re-lists from the last known-good
//! marker, and store dedup absorbs the redeliveries.
//!
//! [`HistoryClient`]: history::HistoryClient
//! [`CursorStore`]: cursor::CursorStore
//! [`WebhookEngine`]: engine::WebhookEngine
//! [`ServiceError`]: error::ServiceError

pub mod cursor;
pub mod engine;
pub mod error;
pub mod history;
pub mod push;

pub use cursor::{CursorStore, FileCursorStore};
pub use engine::WebhookEngine;
pub use error::ServiceError;
pub use history::{HistoryClient, HistoryDelta, RestHistoryClient};
pub use push::{PushRejection, parse_push, router};
