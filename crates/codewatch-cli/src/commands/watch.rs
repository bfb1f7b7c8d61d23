//! `cwatch watch` -- IMAP IDLE watcher with a terminal snapshot view.
//!
//! Connects to the configured mailbox, keeps the connection supervised
//! across failures, and prints every store snapshot as it changes.
//! Exits non-zero when the reconnection budget is exhausted: a silently
//! dead watcher would mean never seeing a code again.

use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use codewatch_core::extract::PatternExtractor;
use codewatch_core::{NotificationStore, snapshot_channel};
use codewatch_mail::{ConnectionSupervisor, IdleWatcher, ImapTransport};

use super::load_config;
use crate::render;

/// Arguments for the `cwatch watch` subcommand.
#[derive(Args)]
pub struct WatchArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the watch command.
pub async fn run(args: WatchArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    if config.mailbox.host.is_empty() || config.mailbox.username.is_empty() {
        anyhow::bail!("mailbox.host and mailbox.username must be configured for watch");
    }

    let transport = Arc::new(ImapTransport::new(config.mailbox.clone()));
    let supervisor = ConnectionSupervisor::new(transport, config.reconnect.clone());
    let extractor = PatternExtractor::new(config.store.lifetime(), config.store.max_body_chars);
    let (publisher, snapshots) = snapshot_channel();

    let watcher = IdleWatcher::new(
        supervisor,
        Box::new(extractor),
        NotificationStore::new(config.store.capacity),
        publisher,
        config.mailbox.clone(),
        config.store.tick_interval(),
    );

    let cancel = CancellationToken::new();
    tokio::spawn(render::follow(snapshots, cancel.clone()));

    info!(
        host = %config.mailbox.host,
        folder = %config.mailbox.folder,
        "watching mailbox"
    );
    let mut watcher_task = tokio::spawn(watcher.run(cancel.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
            cancel.cancel();
            watcher_task.await??;
        }
        res = &mut watcher_task => {
            // Watcher only returns on its own when the reconnection
            // budget is spent.
            cancel.cancel();
            res??;
        }
    }

    Ok(())
}
