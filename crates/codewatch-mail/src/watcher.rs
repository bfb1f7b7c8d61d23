//! The IDLE watch loop.
//!
//! One task owns the session, the store, and the publisher -- it is the
//! sole writer. Each iteration has exactly one suspension point (wait
//! for server push, timer, or cancellation); the aging tick runs after
//! every wake so freshness decays even on a silent inbox.
//!
//! Transport failures abandon the session and reconnect through the
//! supervisor; in-flight work is not retried piecemeal. The next sync
//! pass re-derives state from the mailbox, and store dedup makes the
//! inevitable redeliveries no-ops.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use codewatch_core::extract::{MessageExtractor, RawMessage};
use codewatch_core::{NotificationStore, SnapshotPublisher};
use codewatch_types::MailError;
use codewatch_types::config::MailboxConfig;

use crate::supervisor::ConnectionSupervisor;
use crate::transport::{MailSession, WatchSignal};

/// The push/IDLE event loop over a supervised mail connection.
pub struct IdleWatcher {
    supervisor: ConnectionSupervisor,
    extractor: Box<dyn MessageExtractor>,
    store: NotificationStore,
    publisher: SnapshotPublisher,
    mailbox: MailboxConfig,
    tick_interval: Duration,
}

impl IdleWatcher {
    /// Assemble a watcher. The store and publisher move in: the watch
    /// loop is their sole owner from here on.
    pub fn new(
        supervisor: ConnectionSupervisor,
        extractor: Box<dyn MessageExtractor>,
        store: NotificationStore,
        publisher: SnapshotPublisher,
        mailbox: MailboxConfig,
        tick_interval: Duration,
    ) -> Self {
        Self {
            supervisor,
            extractor,
            store,
            publisher,
            mailbox,
            tick_interval,
        }
    }

    /// Run until cancelled (returns `Ok`) or until the reconnection
    /// budget is exhausted (returns the fatal error for the operator).
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), MailError> {
        loop {
            let mut session = match self.supervisor.connect(&cancel).await {
                Ok(session) => session,
                Err(MailError::Cancelled) => return Ok(()),
                Err(e) => return Err(e),
            };

            match self.watch_session(session.as_mut(), &cancel).await {
                Ok(()) => {
                    info!("watch loop stopped");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "mail session failed, reconnecting");
                }
            }
        }
    }

    /// Drive one session until cancellation (`Ok`) or a transport
    /// error (`Err`, caller reconnects).
    async fn watch_session(
        &mut self,
        session: &mut dyn MailSession,
        cancel: &CancellationToken,
    ) -> Result<(), MailError> {
        // Unconditional first pass: covers mail that arrived while we
        // were not yet (or no longer) listening.
        let mut changed = self.sync_pass(session).await?;
        changed |= self.store.age_tick(Utc::now());
        if changed {
            self.publisher.publish(self.store.snapshot());
        }
        let mut last_sync = Instant::now();

        loop {
            let signal = tokio::select! {
                _ = cancel.cancelled() => None,
                signal = session.wait_for_update(self.tick_interval) => Some(signal?),
            };
            let Some(signal) = signal else {
                // Stop signal: exit at the wait-resolution point, never
                // mid-extraction.
                let _ = session.close().await;
                return Ok(());
            };

            let mut changed = false;
            let wake_due = last_sync.elapsed() >= self.mailbox.wake_interval();
            if signal == WatchSignal::Changed || wake_due {
                changed |= self.sync_pass(session).await?;
                last_sync = Instant::now();
            }

            // Always age, whatever woke us.
            changed |= self.store.age_tick(Utc::now());
            if changed {
                self.publisher.publish(self.store.snapshot());
            }
        }
    }

    /// One bounded synchronization pass: search the trusted sender,
    /// inspect the most recent window, fetch and extract.
    async fn sync_pass(&mut self, session: &mut dyn MailSession) -> Result<bool, MailError> {
        let seqs = session.search_from(&self.mailbox.sender).await?;
        if seqs.is_empty() {
            return Ok(false);
        }

        let window = &seqs[seqs.len().saturating_sub(self.mailbox.search_window)..];
        let targets: Vec<u32> = if self.mailbox.process_all_new {
            window.to_vec()
        } else {
            window.last().copied().into_iter().collect()
        };

        let now = Utc::now();
        let mut changed = false;
        for seq in targets {
            let raw = session.fetch(seq).await?;
            match self.extractor.extract(&RawMessage::Rfc822(raw), now) {
                Some(n) => changed |= self.store.push(n),
                None => debug!(seq, "message did not extract, skipping"),
            }
        }
        Ok(changed)
    }
}
