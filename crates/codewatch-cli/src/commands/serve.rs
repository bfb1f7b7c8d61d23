//! `cwatch serve` -- webhook push endpoint + history engine.
//!
//! Binds the `POST /pubsub/push` endpoint and runs the engine that
//! turns push markers into history fetches, extractions, and snapshot
//! publications. The HTTP handler only queues markers; all provider
//! round trips happen on the engine task.

use std::sync::Arc;

use clap::Args;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use codewatch_core::extract::StructuredExtractor;
use codewatch_core::{NotificationStore, snapshot_channel};
use codewatch_services::{FileCursorStore, RestHistoryClient, WebhookEngine, router};
use codewatch_types::secret::SecretString;

use super::load_config;
use crate::render;

/// Arguments for the `cwatch serve` subcommand.
#[derive(Args)]
pub struct ServeArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    if config.webhook.api_base_url.is_empty() {
        anyhow::bail!("webhook.apiBaseUrl must be configured for serve");
    }

    let token = SecretString::from_env(&config.webhook.api_token_env);
    if token.is_none() {
        info!(
            env = %config.webhook.api_token_env,
            "api token env var not set, requests go unauthenticated"
        );
    }

    let history = Arc::new(RestHistoryClient::new(
        config.webhook.api_base_url.clone(),
        token,
    ));
    let cursor = Box::new(FileCursorStore::new(config.webhook.cursor_path()));
    let extractor = StructuredExtractor::new(config.store.lifetime(), config.store.max_body_chars);
    let (publisher, snapshots) = snapshot_channel();

    let engine = WebhookEngine::new(
        history,
        cursor,
        Box::new(extractor),
        NotificationStore::new(config.store.capacity),
        publisher,
        config.webhook.excluded_labels.clone(),
        config.store.tick_interval(),
    );

    // Small backlog: pushes carry no payload, so a dropped one is
    // recovered by cursor catch-up on the next.
    let (markers_tx, markers_rx) = mpsc::channel(32);
    let app = router(markers_tx);

    let cancel = CancellationToken::new();
    let engine_task = tokio::spawn(engine.run(markers_rx, cancel.clone()));
    tokio::spawn(render::follow(snapshots, cancel.clone()));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
        }
        signal_cancel.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&config.webhook.bind).await?;
    info!(addr = %config.webhook.bind, "push endpoint listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    cancel.cancel();
    engine_task.await?;
    Ok(())
}
