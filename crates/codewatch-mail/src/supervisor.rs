//! Connection supervision.
//!
//! Wraps a [`MailTransport`] with a bounded-retry policy: a fixed
//! delay between attempts and a hard attempt budget. Exhausting the
//! budget is fatal for the watcher -- a silent permanent disconnect
//! would mean never seeing another code, so the error must reach the
//! operator.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use codewatch_types::MailError;
use codewatch_types::config::ReconnectConfig;

use crate::transport::{MailSession, MailTransport};

/// Bounded-retry connector around a [`MailTransport`].
pub struct ConnectionSupervisor {
    transport: Arc<dyn MailTransport>,
    policy: ReconnectConfig,
}

impl ConnectionSupervisor {
    /// Supervise `transport` under the given retry policy.
    pub fn new(transport: Arc<dyn MailTransport>, policy: ReconnectConfig) -> Self {
        Self { transport, policy }
    }

    /// Establish a session, retrying up to the configured budget with
    /// a fixed inter-attempt delay.
    ///
    /// Returns [`MailError::Cancelled`] if `cancel` fires while
    /// waiting between attempts, and [`MailError::RetriesExhausted`]
    /// once the budget is spent. Both end this connection lifecycle;
    /// only the former is a clean shutdown.
    pub async fn connect(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn MailSession>, MailError> {
        for attempt in 1..=self.policy.max_retries {
            if cancel.is_cancelled() {
                return Err(MailError::Cancelled);
            }

            match self.transport.connect().await {
                Ok(session) => {
                    info!(attempt, "mail connection established");
                    return Ok(session);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        error = %e,
                        "connection attempt failed"
                    );
                }
            }

            // Reconnection sleeps are bounded and count toward the
            // retry budget.
            if attempt < self.policy.max_retries {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(MailError::Cancelled),
                    _ = tokio::time::sleep(self.policy.retry_delay()) => {}
                }
            }
        }

        Err(MailError::RetriesExhausted {
            attempts: self.policy.max_retries,
        })
    }
}
