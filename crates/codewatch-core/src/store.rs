//! Bounded, deduplicating, self-aging notification store.
//!
//! Insertion order is preserved. Capacity pressure evicts the oldest
//! entry (FIFO -- freshness is time-derived, not access-derived), and
//! the aging tick removes expired entries independently of capacity.
//!
//! The store deliberately has no locking: per the concurrency model it
//! is exclusively owned by one engine task, and readers only ever get
//! [`snapshot`](NotificationStore::snapshot) copies.

use chrono::{DateTime, Utc};
use tracing::debug;

use codewatch_types::{Notification, Snapshot};

/// Ordered collection of notifications with a fixed capacity.
#[derive(Debug)]
pub struct NotificationStore {
    capacity: usize,
    items: Vec<Notification>,
}

impl NotificationStore {
    /// Create an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of notifications currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a notification with this id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|n| n.id == id)
    }

    /// Append a notification.
    ///
    /// No-op when the id is empty or already present -- both event
    /// sources may redeliver the same underlying message after a
    /// reconnect or re-fetch, and redelivery must be idempotent.
    /// Evicts the oldest entry when the capacity is exceeded.
    ///
    /// Returns `true` when the observable contents changed.
    pub fn push(&mut self, n: Notification) -> bool {
        if n.id.is_empty() {
            debug!("dropping notification with empty id");
            return false;
        }
        if self.contains(&n.id) {
            debug!(id = %n.id, "duplicate notification, ignoring");
            return false;
        }

        debug!(id = %n.id, code = ?n.code, "notification stored");
        self.items.push(n);
        while self.items.len() > self.capacity {
            let evicted = self.items.remove(0);
            debug!(id = %evicted.id, "capacity eviction");
        }
        true
    }

    /// Recompute every entry's freshness bucket for `now` and remove
    /// expired entries.
    ///
    /// Pure in `now`: ticking twice with the same instant yields the
    /// same contents and buckets. Must be driven on a fixed cadence
    /// regardless of message arrival so buckets age on a silent inbox.
    ///
    /// Returns `true` when the observable contents changed.
    pub fn age_tick(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|n| {
            let expired = n.is_expired_at(now);
            if expired {
                debug!(id = %n.id, "notification expired");
            }
            !expired
        });
        let mut changed = self.items.len() != before;

        for n in &mut self.items {
            let bucket = n.bucket_at(now);
            if n.age_bucket != bucket {
                n.age_bucket = bucket;
                changed = true;
            }
        }
        changed
    }

    /// Ordered copy of the current contents. The only read path.
    pub fn snapshot(&self) -> Snapshot {
        self.items.clone()
    }
}
