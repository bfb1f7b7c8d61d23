//! The webhook-variant engine task.
//!
//! One task owns the store, the cursor, and the publisher. Push markers
//! arrive over a channel from the HTTP handler; the aging tick runs on
//! this same loop so ordering relative to pushes stays deterministic.
//!
//! Cursor discipline: load before listing (default to the push's own
//! marker on cold start), persist after processing (the provider's
//! latest marker, falling back to the push's). A push with an empty
//! delta still advances the cursor. Failed persists are logged and
//! absorbed: the next push recomputes from the last known-good marker,
//! and store dedup makes the resulting redelivery harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use codewatch_core::extract::{MessageExtractor, RawMessage};
use codewatch_core::{NotificationStore, SnapshotPublisher};

use crate::cursor::CursorStore;
use crate::history::HistoryClient;

/// Drives extraction off inbound push markers.
pub struct WebhookEngine {
    history: Arc<dyn HistoryClient>,
    cursor: Box<dyn CursorStore>,
    extractor: Box<dyn MessageExtractor>,
    store: NotificationStore,
    publisher: SnapshotPublisher,
    excluded_labels: Vec<String>,
    tick_interval: Duration,
}

impl WebhookEngine {
    pub fn new(
        history: Arc<dyn HistoryClient>,
        cursor: Box<dyn CursorStore>,
        extractor: Box<dyn MessageExtractor>,
        store: NotificationStore,
        publisher: SnapshotPublisher,
        excluded_labels: Vec<String>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            history,
            cursor,
            extractor,
            store,
            publisher,
            excluded_labels,
            tick_interval,
        }
    }

    /// Run until cancelled or until every push sender is gone.
    pub async fn run(mut self, mut markers: mpsc::Receiver<String>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("webhook engine stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if self.store.age_tick(Utc::now()) {
                        self.publisher.publish(self.store.snapshot());
                    }
                }
                marker = markers.recv() => {
                    match marker {
                        Some(marker) => self.process_push(&marker).await,
                        None => {
                            info!("push channel closed, webhook engine stopping");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Handle one push: list history from the persisted cursor, extract
    /// added messages, advance the cursor.
    async fn process_push(&mut self, marker: &str) {
        let start = match self.cursor.load() {
            Ok(Some(cursor)) => cursor,
            Ok(None) => {
                debug!(marker, "no persisted cursor, starting from push marker");
                marker.to_string()
            }
            Err(e) => {
                warn!(error = %e, marker, "cursor read failed, starting from push marker");
                marker.to_string()
            }
        };

        let delta = match self.history.list_added_since(&start).await {
            Ok(delta) => delta,
            Err(e) => {
                // Cursor untouched: the next push re-lists from here.
                warn!(error = %e, start, "history listing failed");
                return;
            }
        };

        let now = Utc::now();
        let mut changed = false;
        for id in &delta.added {
            let msg = match self.history.get_message(id).await {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, id, "message fetch failed, skipping");
                    continue;
                }
            };
            if msg.has_any_label(&self.excluded_labels) {
                debug!(id, "excluded label, skipping");
                continue;
            }
            if let Some(n) = self.extractor.extract(&RawMessage::Api(msg), now) {
                changed |= self.store.push(n);
            }
        }
        if changed {
            self.publisher.publish(self.store.snapshot());
        }

        // An empty delta still advances the cursor to the push's own
        // marker.
        let next = delta.latest_marker.unwrap_or_else(|| marker.to_string());
        if let Err(e) = self.cursor.store(&next) {
            warn!(error = %e, next, "cursor write failed, next push recomputes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use codewatch_core::extract::{ApiMessage, StructuredExtractor};
    use codewatch_core::snapshot_channel;
    use codewatch_types::Snapshot;

    use crate::error::ServiceError;
    use crate::history::HistoryDelta;

    struct MemoryCursor {
        inner: Mutex<Option<String>>,
        fail_store: bool,
    }

    impl MemoryCursor {
        fn new() -> Self {
            Self {
                inner: Mutex::new(None),
                fail_store: false,
            }
        }
    }

    impl CursorStore for MemoryCursor {
        fn load(&self) -> Result<Option<String>, ServiceError> {
            Ok(self.inner.lock().unwrap().clone())
        }

        fn store(&self, marker: &str) -> Result<(), ServiceError> {
            if self.fail_store {
                return Err(std::io::Error::other("disk full").into());
            }
            *self.inner.lock().unwrap() = Some(marker.to_string());
            Ok(())
        }
    }

    struct ScriptedHistory {
        deltas: Mutex<VecDeque<Result<HistoryDelta, ServiceError>>>,
        starts: Mutex<Vec<String>>,
        messages: HashMap<String, ApiMessage>,
    }

    impl ScriptedHistory {
        fn new(deltas: Vec<Result<HistoryDelta, ServiceError>>) -> Self {
            Self {
                deltas: Mutex::new(deltas.into()),
                starts: Mutex::new(Vec::new()),
                messages: HashMap::new(),
            }
        }

        fn with_message(mut self, msg: ApiMessage) -> Self {
            self.messages.insert(msg.id.clone(), msg);
            self
        }
    }

    #[async_trait]
    impl HistoryClient for ScriptedHistory {
        async fn list_added_since(&self, start: &str) -> Result<HistoryDelta, ServiceError> {
            self.starts.lock().unwrap().push(start.to_string());
            self.deltas
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HistoryDelta::default()))
        }

        async fn get_message(&self, id: &str) -> Result<ApiMessage, ServiceError> {
            self.messages
                .get(id)
                .cloned()
                .ok_or(ServiceError::Api { status: 404 })
        }
    }

    fn code_message(id: &str, code: &str) -> ApiMessage {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "labelIds": ["INBOX"],
            "snippet": format!("Your verification code is: {code}"),
            "payload": { "headers": [
                { "name": "Date", "value": Utc::now().to_rfc2822() }
            ] }
        }))
        .unwrap()
    }

    fn delta(ids: &[&str], latest: Option<&str>) -> Result<HistoryDelta, ServiceError> {
        Ok(HistoryDelta {
            added: ids.iter().map(|s| s.to_string()).collect(),
            latest_marker: latest.map(String::from),
        })
    }

    struct Rig {
        engine: WebhookEngine,
        rx: tokio::sync::watch::Receiver<Snapshot>,
    }

    fn rig(history: Arc<ScriptedHistory>, cursor: MemoryCursor) -> Rig {
        let (publisher, rx) = snapshot_channel();
        let engine = WebhookEngine::new(
            history,
            Box::new(cursor),
            Box::new(StructuredExtractor::new(
                chrono::Duration::seconds(300),
                400,
            )),
            NotificationStore::new(5),
            publisher,
            vec!["SENT".into(), "DRAFT".into()],
            Duration::from_secs(1),
        );
        Rig { engine, rx }
    }

    fn cursor_of(engine: &WebhookEngine) -> Option<String> {
        engine.cursor.load().unwrap()
    }

    #[tokio::test]
    async fn cold_start_empty_delta_still_advances_cursor() {
        let history = Arc::new(ScriptedHistory::new(vec![delta(&[], None)]));
        let mut r = rig(history.clone(), MemoryCursor::new());

        r.engine.process_push("500").await;

        assert_eq!(cursor_of(&r.engine).as_deref(), Some("500"));
        assert_eq!(history.starts.lock().unwrap().as_slice(), ["500"]);
        assert!(r.rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn added_messages_are_extracted_and_cursor_follows_provider() {
        let history = Arc::new(
            ScriptedHistory::new(vec![delta(&["m1", "m2"], Some("620"))])
                .with_message(code_message("m1", "111111"))
                .with_message(code_message("m2", "222222")),
        );
        let mut r = rig(history, MemoryCursor::new());

        r.engine.process_push("600").await;

        let snap = r.rx.borrow().clone();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].code.as_deref(), Some("111111"));
        assert_eq!(snap[1].code.as_deref(), Some("222222"));
        assert_eq!(cursor_of(&r.engine).as_deref(), Some("620"));
    }

    #[tokio::test]
    async fn persisted_cursor_is_the_listing_start() {
        let history = Arc::new(ScriptedHistory::new(vec![
            delta(&[], Some("510")),
            delta(&[], None),
        ]));
        let mut r = rig(history.clone(), MemoryCursor::new());

        r.engine.process_push("500").await;
        r.engine.process_push("700").await;

        // Second listing resumes from the persisted "510", not the new
        // push's marker; the empty second delta then falls back to it.
        assert_eq!(history.starts.lock().unwrap().as_slice(), ["500", "510"]);
        assert_eq!(cursor_of(&r.engine).as_deref(), Some("700"));
    }

    #[tokio::test]
    async fn excluded_labels_never_reach_the_extractor() {
        let mut sent = code_message("m1", "111111");
        sent.label_ids = vec!["SENT".into()];
        let history =
            Arc::new(ScriptedHistory::new(vec![delta(&["m1"], Some("510"))]).with_message(sent));
        let mut r = rig(history, MemoryCursor::new());

        r.engine.process_push("500").await;

        assert!(r.rx.borrow().is_empty());
        assert_eq!(cursor_of(&r.engine).as_deref(), Some("510"));
    }

    #[tokio::test]
    async fn redelivered_message_is_deduplicated() {
        let history = Arc::new(
            ScriptedHistory::new(vec![
                delta(&["m1"], Some("510")),
                delta(&["m1", "m2"], Some("520")),
            ])
            .with_message(code_message("m1", "111111"))
            .with_message(code_message("m2", "222222")),
        );
        let mut r = rig(history, MemoryCursor::new());

        r.engine.process_push("500").await;
        r.engine.process_push("515").await;

        let snap = r.rx.borrow().clone();
        let ids: Vec<_> = snap.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn history_failure_leaves_cursor_untouched() {
        let history = Arc::new(ScriptedHistory::new(vec![Err(ServiceError::Api {
            status: 500,
        })]));
        let cursor = MemoryCursor::new();
        *cursor.inner.lock().unwrap() = Some("480".into());
        let mut r = rig(history, cursor);

        r.engine.process_push("500").await;

        assert_eq!(cursor_of(&r.engine).as_deref(), Some("480"));
        assert!(r.rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn cursor_write_failure_does_not_drop_notifications() {
        let history = Arc::new(
            ScriptedHistory::new(vec![delta(&["m1"], Some("510"))])
                .with_message(code_message("m1", "111111")),
        );
        let mut cursor = MemoryCursor::new();
        cursor.fail_store = true;
        let mut r = rig(history, cursor);

        r.engine.process_push("500").await;

        let snap = r.rx.borrow().clone();
        assert_eq!(snap.len(), 1);
        assert_eq!(cursor_of(&r.engine), None);
    }

    #[tokio::test]
    async fn unfetchable_message_is_skipped_not_fatal() {
        let history = Arc::new(
            ScriptedHistory::new(vec![delta(&["ghost", "m2"], Some("510"))])
                .with_message(code_message("m2", "222222")),
        );
        let mut r = rig(history, MemoryCursor::new());

        r.engine.process_push("500").await;

        let snap = r.rx.borrow().clone();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, "m2");
    }
}
