//! Message-to-notification extraction.
//!
//! One contract, two strategies:
//!
//! - [`PatternExtractor`] scrapes a flattened RFC 822 rendering (IMAP
//!   variant)
//! - [`StructuredExtractor`] reads header and preview fields of an API
//!   message object (webhook variant)
//!
//! `None` from [`MessageExtractor::extract`] means "this message is not
//! a verification mail". It is the common case, never an error.

mod pattern;
mod structured;

pub use pattern::PatternExtractor;
pub use structured::StructuredExtractor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use codewatch_types::Notification;

/// A raw message as produced by one of the two event sources.
#[derive(Debug, Clone)]
pub enum RawMessage {
    /// Full RFC 822 message text from an IMAP fetch.
    Rfc822(String),
    /// Structured message object from the hosted-mail API.
    Api(ApiMessage),
}

/// Structured message object returned by the hosted-mail API
/// (`messages.get`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiMessage {
    /// Provider-assigned message id.
    pub id: String,
    /// Labels attached to the message (e.g. `INBOX`, `SENT`).
    pub label_ids: Vec<String>,
    /// Short plain-ish preview of the body.
    pub snippet: String,
    /// Parsed payload; only the header list is used here.
    pub payload: ApiPayload,
}

/// Payload portion of an [`ApiMessage`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiPayload {
    /// Message headers as name/value pairs.
    pub headers: Vec<ApiHeader>,
}

/// One message header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiHeader {
    /// Header name, e.g. `Date`.
    pub name: String,
    /// Raw header value.
    pub value: String,
}

impl ApiMessage {
    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Whether the message carries any of the given labels.
    pub fn has_any_label(&self, labels: &[String]) -> bool {
        self.label_ids
            .iter()
            .any(|l| labels.iter().any(|x| x.eq_ignore_ascii_case(l)))
    }
}

/// Extraction contract shared by both strategies.
///
/// Implementations are pure: same message and clock in, same result
/// out, no side effects. The engine selects the implementation matching
/// the event source that produced the raw message.
pub trait MessageExtractor: Send + Sync {
    /// Extract at most one notification from a raw message.
    fn extract(&self, msg: &RawMessage, now: DateTime<Utc>) -> Option<Notification>;
}
