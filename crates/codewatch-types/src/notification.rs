//! Notification data model.
//!
//! A [`Notification`] is one extracted verification-code event. Its
//! freshness bucket is always derived from `(now, occurred_at,
//! expires_at)` -- it is carried on the struct only so that snapshots
//! serialize it for consumers, and the store recomputes it on every
//! aging tick.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Freshness bucket of a notification, derived from its age.
///
/// With `ratio = elapsed / lifetime`:
///
/// - `ratio < 1/3` (strict) -> `Fresh`
/// - `ratio < 2/3` -> `Aging`
/// - otherwise -> `Stale`
///
/// A ratio at or above 1.0 means the notification is expired and is
/// removed by the next aging tick rather than bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    /// Less than a third of the lifetime has elapsed.
    Fresh,
    /// Between a third and two thirds.
    Aging,
    /// Past two thirds, still observable.
    Stale,
}

impl AgeBucket {
    /// Bucket for an elapsed/lifetime ratio. Callers are expected to
    /// have handled `ratio >= 1.0` (expiry) already; this saturates
    /// to `Stale`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 1.0 / 3.0 {
            AgeBucket::Fresh
        } else if ratio < 2.0 / 3.0 {
            AgeBucket::Aging
        } else {
            AgeBucket::Stale
        }
    }
}

/// An extracted verification-code event.
///
/// Serialized field names are camelCase: this struct is the wire shape
/// of the snapshot channel, and consumers may live in another process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Opaque identifier, stable per source message. Primary dedup key.
    pub id: String,

    /// When the underlying message was sent/delivered (UTC).
    pub occurred_at: DateTime<Utc>,

    /// Extracted verification code. `None` means the envelope matched
    /// but carried no code; identity and time are still meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable snippet, markup stripped, bounded length.
    pub body: String,

    /// `occurred_at + lifetime`. Always strictly after `occurred_at`.
    pub expires_at: DateTime<Utc>,

    /// Freshness bucket as of the last aging tick.
    pub age_bucket: AgeBucket,
}

impl Notification {
    /// Build a notification expiring `lifetime` after `occurred_at`.
    ///
    /// The initial bucket is computed for `occurred_at` itself (i.e.
    /// `Fresh`); the store's first aging tick corrects it for the
    /// actual clock.
    pub fn new(
        id: impl Into<String>,
        occurred_at: DateTime<Utc>,
        code: Option<String>,
        body: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            occurred_at,
            code,
            body: body.into(),
            expires_at: occurred_at + lifetime,
            age_bucket: AgeBucket::Fresh,
        }
    }

    /// Lifetime this notification was created with.
    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.occurred_at
    }

    /// Elapsed/lifetime ratio at `now`. Negative elapsed (clock skew,
    /// future-dated mail) clamps to zero.
    pub fn age_ratio(&self, now: DateTime<Utc>) -> f64 {
        let lifetime_ms = self.lifetime().num_milliseconds();
        if lifetime_ms <= 0 {
            return 1.0;
        }
        let elapsed_ms = (now - self.occurred_at).num_milliseconds().max(0);
        elapsed_ms as f64 / lifetime_ms as f64
    }

    /// Whether the aging tick at `now` would remove this notification.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.age_ratio(now) >= 1.0
    }

    /// Bucket this notification belongs in at `now`.
    pub fn bucket_at(&self, now: DateTime<Utc>) -> AgeBucket {
        AgeBucket::from_ratio(self.age_ratio(now))
    }
}

/// An immutable, ordered, full-replace copy of the store's contents.
///
/// Consumers must treat every delivery as a complete replacement,
/// never a delta.
pub type Snapshot = Vec<Notification>;
