//! Incremental history fetch against the hosted-mail API.
//!
//! A push carries only "something changed, as of marker M". The engine
//! asks this client for the change records between its persisted cursor
//! and now, then fetches each added message in full.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use codewatch_core::extract::ApiMessage;
use codewatch_types::secret::SecretString;

use crate::error::ServiceError;

/// What one history query yielded: the ids of added messages, and the
/// newest marker the provider reported (absent on an empty delta).
#[derive(Debug, Clone, Default)]
pub struct HistoryDelta {
    /// Ids of messages added since the query's start marker.
    pub added: Vec<String>,
    /// Latest history marker reported by the provider.
    pub latest_marker: Option<String>,
}

/// Client seam for the provider's history and message APIs.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// List message-added records from `start` forward.
    async fn list_added_since(&self, start: &str) -> Result<HistoryDelta, ServiceError>;

    /// Fetch one message in full.
    async fn get_message(&self, id: &str) -> Result<ApiMessage, ServiceError>;
}

// Wire shapes for the provider's history listing. Markers arrive as
// numbers or strings depending on the endpoint, so they deserialize
// through serde_json::Number-tolerant helpers below.

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct HistoryResponse {
    history: Vec<HistoryRecord>,
    history_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct HistoryRecord {
    messages_added: Vec<AddedMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AddedMessage {
    message: MessageRef,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MessageRef {
    id: String,
}

/// Render a JSON marker as its canonical string form. The provider
/// sends `historyId` as a number in some payloads and a string in
/// others.
pub(crate) fn marker_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// REST implementation of [`HistoryClient`] over the hosted-mail API.
pub struct RestHistoryClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl RestHistoryClient {
    /// `base_url` without a trailing slash; `token` is sent as a bearer
    /// credential when present.
    pub fn new(base_url: String, token: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token.expose()),
            None => req,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let resp = self
            .authed(self.http.get(&url).query(query))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl HistoryClient for RestHistoryClient {
    async fn list_added_since(&self, start: &str) -> Result<HistoryDelta, ServiceError> {
        let url = format!("{}/users/me/history", self.base_url);
        let resp: HistoryResponse = self
            .get_json(
                url,
                &[("startHistoryId", start), ("historyTypes", "messageAdded")],
            )
            .await?;

        let added: Vec<String> = resp
            .history
            .iter()
            .flat_map(|r| r.messages_added.iter())
            .map(|a| a.message.id.clone())
            .filter(|id| !id.is_empty())
            .collect();
        debug!(start, count = added.len(), "history listed");

        Ok(HistoryDelta {
            added,
            latest_marker: resp.history_id.as_ref().and_then(marker_to_string),
        })
    }

    async fn get_message(&self, id: &str) -> Result<ApiMessage, ServiceError> {
        let url = format!("{}/users/me/messages/{id}", self.base_url);
        self.get_json(url, &[("format", "full")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_response_parses() {
        let json = r#"{
            "history": [
                { "messagesAdded": [ { "message": { "id": "m1" } } ] },
                { "messagesAdded": [
                    { "message": { "id": "m2" } },
                    { "message": { "id": "m3" } }
                ] }
            ],
            "historyId": "184300"
        }"#;
        let resp: HistoryResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = resp
            .history
            .iter()
            .flat_map(|r| r.messages_added.iter())
            .map(|a| a.message.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(
            resp.history_id.as_ref().and_then(marker_to_string).as_deref(),
            Some("184300")
        );
    }

    #[test]
    fn empty_history_is_a_valid_delta() {
        let resp: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.history.is_empty());
        assert!(resp.history_id.is_none());
    }

    #[test]
    fn numeric_marker_renders_as_string() {
        let v = serde_json::json!(184300);
        assert_eq!(marker_to_string(&v).as_deref(), Some("184300"));
        let v = serde_json::json!("184300");
        assert_eq!(marker_to_string(&v).as_deref(), Some("184300"));
        assert_eq!(marker_to_string(&serde_json::Value::Null), None);
        assert_eq!(marker_to_string(&serde_json::json!("")), None);
    }
}
