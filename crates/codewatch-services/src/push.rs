//! The inbound push endpoint.
//!
//! Accepts the provider's push shape `{ "message": { "data": <base64
//! JSON> } }`, pulls the history marker out, and hands it to the engine
//! over a channel. The handler answers immediately: no mail-provider
//! round trip ever happens on the HTTP path.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::history::marker_to_string;

/// Why an inbound push was rejected at the boundary.
#[derive(Error, Debug)]
pub enum PushRejection {
    /// The request body was not a JSON object.
    #[error("body is not valid json")]
    NotJson,

    /// The envelope lacked the `message` field.
    #[error("envelope has no message")]
    MissingMessage,

    /// The `data` field did not decode to base64-wrapped JSON.
    #[error("data payload is malformed: {0}")]
    BadData(String),
}

#[derive(Deserialize)]
struct PushEnvelope {
    message: Option<PushMessage>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PushMessage {
    data: Option<String>,
}

/// Parse a push body down to its history marker.
///
/// `Ok(None)` is a well-formed push that carries nothing to act on (no
/// `data`, or a payload without a marker). `Err` is a malformed
/// envelope and maps to a client error.
pub fn parse_push(body: &[u8]) -> Result<Option<String>, PushRejection> {
    let envelope: PushEnvelope =
        serde_json::from_slice(body).map_err(|_| PushRejection::NotJson)?;
    let message = envelope.message.ok_or(PushRejection::MissingMessage)?;

    let Some(data) = message.data else {
        return Ok(None);
    };

    let decoded = BASE64
        .decode(data.as_bytes())
        .map_err(|e| PushRejection::BadData(e.to_string()))?;
    let payload: serde_json::Value =
        serde_json::from_slice(&decoded).map_err(|e| PushRejection::BadData(e.to_string()))?;

    Ok(payload.get("historyId").and_then(marker_to_string))
}

/// Router exposing `POST /pubsub/push`, feeding markers into `tx`.
pub fn router(tx: mpsc::Sender<String>) -> Router {
    Router::new()
        .route("/pubsub/push", post(receive_push))
        .layer(TraceLayer::new_for_http())
        .with_state(tx)
}

async fn receive_push(State(tx): State<mpsc::Sender<String>>, body: Bytes) -> StatusCode {
    let marker = match parse_push(&body) {
        Ok(Some(marker)) => marker,
        Ok(None) => {
            debug!("push without marker, acknowledged");
            return StatusCode::OK;
        }
        Err(e) => {
            warn!(error = %e, "rejected push");
            return StatusCode::BAD_REQUEST;
        }
    };

    match tx.try_send(marker) {
        Ok(()) => StatusCode::OK,
        Err(mpsc::error::TrySendError::Full(_)) => {
            // Acknowledge anyway: at-least-once redelivery plus cursor
            // catch-up covers the dropped signal.
            warn!("engine backlog full, push dropped");
            StatusCode::OK
        }
        Err(mpsc::error::TrySendError::Closed(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn push_body(payload: serde_json::Value) -> String {
        let data = BASE64.encode(payload.to_string());
        serde_json::json!({ "message": { "data": data } }).to_string()
    }

    fn post_push(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/pubsub/push")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[test]
    fn parse_extracts_string_marker() {
        let body = push_body(serde_json::json!({ "historyId": "184300" }));
        let marker = parse_push(body.as_bytes()).unwrap();
        assert_eq!(marker.as_deref(), Some("184300"));
    }

    #[test]
    fn parse_extracts_numeric_marker() {
        let body = push_body(serde_json::json!({ "historyId": 184300 }));
        let marker = parse_push(body.as_bytes()).unwrap();
        assert_eq!(marker.as_deref(), Some("184300"));
    }

    #[test]
    fn missing_message_is_rejected() {
        let err = parse_push(b"{}").unwrap_err();
        assert!(matches!(err, PushRejection::MissingMessage));
    }

    #[test]
    fn garbage_body_is_rejected() {
        let err = parse_push(b"not json").unwrap_err();
        assert!(matches!(err, PushRejection::NotJson));
    }

    #[test]
    fn bad_base64_is_rejected() {
        let body = serde_json::json!({ "message": { "data": "!!!" } }).to_string();
        let err = parse_push(body.as_bytes()).unwrap_err();
        assert!(matches!(err, PushRejection::BadData(_)));
    }

    #[test]
    fn data_less_message_is_a_no_op() {
        let body = serde_json::json!({ "message": {} }).to_string();
        assert_eq!(parse_push(body.as_bytes()).unwrap(), None);
    }

    #[test]
    fn payload_without_marker_is_a_no_op() {
        let body = push_body(serde_json::json!({ "emailAddress": "a@b" }));
        assert_eq!(parse_push(body.as_bytes()).unwrap(), None);
    }

    #[tokio::test]
    async fn valid_push_queues_the_marker() {
        let (tx, mut rx) = mpsc::channel(8);
        let app = router(tx);

        let body = push_body(serde_json::json!({ "historyId": 42 }));
        let resp = app.oneshot(post_push(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(rx.recv().await.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn malformed_envelope_gets_400() {
        let (tx, mut rx) = mpsc::channel(8);
        let app = router(tx);

        let resp = app.oneshot(post_push(r#"{"nope":1}"#)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_delta_push_still_succeeds() {
        let (tx, mut rx) = mpsc::channel(8);
        let app = router(tx);

        let body = serde_json::json!({ "message": {} }).to_string();
        let resp = app.oneshot(post_push(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }
}
