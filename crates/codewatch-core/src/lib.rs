//! # codewatch-core
//!
//! The notification lifecycle engine: everything between "a raw message
//! arrived" and "a consumer saw an ordered, deduplicated, freshness-aware
//! snapshot".
//!
//! - **[`store`]** -- [`NotificationStore`]: bounded, insertion-ordered,
//!   deduplicating, self-aging
//! - **[`extract`]** -- the [`MessageExtractor`] contract and its two
//!   strategies (pattern scrape, structured fields)
//! - **[`markup`]** -- tag stripping and snippet bounding
//! - **[`publish`]** -- snapshot publication with latest-value-replace
//!   semantics
//!
//! The store has no interior locking: it is owned by exactly one engine
//! task (the IMAP watch loop or the webhook engine), which is its sole
//! writer. Consumers only ever receive [`Snapshot`] copies.
//!
//! [`NotificationStore`]: store::NotificationStore
//! [`MessageExtractor`]: extract::MessageExtractor
//! [`Snapshot`]: codewatch_types::Snapshot

pub mod extract;
pub mod markup;
pub mod publish;
pub mod store;

pub use extract::{MessageExtractor, RawMessage};
pub use publish::{SnapshotPublisher, snapshot_channel};
pub use store::NotificationStore;
