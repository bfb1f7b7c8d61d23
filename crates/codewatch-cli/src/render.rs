//! Terminal snapshot view.
//!
//! A pure consumer of the snapshot channel: every delivery is a full
//! replace. Freshness maps to color (fresh green, aging yellow, stale
//! red), matching the lifetime buckets the store maintains.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use codewatch_types::{AgeBucket, Notification, Snapshot};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn color(bucket: AgeBucket) -> &'static str {
    match bucket {
        AgeBucket::Fresh => GREEN,
        AgeBucket::Aging => YELLOW,
        AgeBucket::Stale => RED,
    }
}

/// Render one notification as a single terminal line.
pub fn line(n: &Notification) -> String {
    let code = n.code.as_deref().unwrap_or("------");
    let body: String = n.body.chars().take(80).collect();
    format!(
        "{}{}  {}  {}{}",
        color(n.age_bucket),
        code,
        n.occurred_at.format("%H:%M:%S"),
        body,
        RESET,
    )
}

fn print_snapshot(snapshot: &Snapshot) {
    if snapshot.is_empty() {
        println!("(no active codes)");
        return;
    }
    for n in snapshot {
        println!("{}", line(n));
    }
    println!();
}

/// Follow the snapshot channel until cancellation or until the
/// publishing task goes away.
pub async fn follow(mut rx: watch::Receiver<Snapshot>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
                print_snapshot(&rx.borrow_and_update());
            }
        }
    }
}
