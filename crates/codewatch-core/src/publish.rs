//! Snapshot publication.
//!
//! The engine task publishes a full copy of the store after any
//! mutating pass; consumers hold the receiving end of a
//! `tokio::sync::watch` channel. Watch semantics are exactly the
//! contract the display layer needs: each publish replaces the pending
//! value, so a slow consumer never blocks the writer and always
//! observes the latest full snapshot, never a backlog of deltas.
//!
//! Snapshots are plain serde-serializable vectors, so a consumer in a
//! separate process can be fed by serializing each delivery across the
//! boundary -- no shared memory is involved.

use tokio::sync::watch;

use codewatch_types::Snapshot;

/// Create a connected publisher/receiver pair, starting empty.
pub fn snapshot_channel() -> (SnapshotPublisher, watch::Receiver<Snapshot>) {
    let (tx, rx) = watch::channel(Snapshot::new());
    (SnapshotPublisher { tx }, rx)
}

/// Writing end of the snapshot channel. Owned by the engine task.
pub struct SnapshotPublisher {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotPublisher {
    /// Replace the pending snapshot with a new one.
    ///
    /// Never blocks. Publishing with no live consumer is fine; the
    /// value waits for the next subscriber.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Open another receiving handle (e.g. one per display surface).
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }
}
