//! Structured-field extraction strategy.
//!
//! Reads an [`ApiMessage`] as returned by the hosted-mail API: send
//! time from the `Date` header (falling back to the current clock when
//! absent or unparsable), the body from the preview snippet, and the
//! code as the first standalone six-digit run in that snippet.
//!
//! A message without a code still yields a notification -- identity and
//! time are meaningful on their own. Already-expired candidates are let
//! through; the store's next aging tick removes them.

use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use codewatch_types::Notification;

use crate::markup;

use super::{ApiMessage, MessageExtractor, RawMessage};

/// Extractor for structured API message objects.
pub struct StructuredExtractor {
    lifetime: chrono::Duration,
    max_body_chars: usize,
    code: Regex,
}

impl StructuredExtractor {
    /// Create an extractor producing notifications with the given
    /// lifetime and body bound.
    pub fn new(lifetime: chrono::Duration, max_body_chars: usize) -> Self {
        Self {
            lifetime,
            max_body_chars,
            code: Regex::new(r"\b(\d{6})\b").unwrap(),
        }
    }

    /// Send time from the `Date` header, or `now` when it is missing
    /// or unparsable.
    fn occurred_at(msg: &ApiMessage, now: DateTime<Utc>) -> DateTime<Utc> {
        match msg.header("Date") {
            Some(raw) => match DateTime::parse_from_rfc2822(raw) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    debug!(error = %e, "unparsable Date header, using now");
                    now
                }
            },
            None => now,
        }
    }

    /// Provider id, or a deterministic fallback when the provider
    /// returned none.
    fn message_id(msg: &ApiMessage, occurred_at: DateTime<Utc>) -> String {
        if !msg.id.is_empty() {
            return msg.id.clone();
        }
        let mut hasher = DefaultHasher::new();
        msg.snippet.hash(&mut hasher);
        format!("{}-{:016x}", occurred_at.timestamp_millis(), hasher.finish())
    }
}

impl MessageExtractor for StructuredExtractor {
    fn extract(&self, msg: &RawMessage, now: DateTime<Utc>) -> Option<Notification> {
        let RawMessage::Api(msg) = msg else {
            return None;
        };

        let occurred_at = Self::occurred_at(msg, now);
        let code = self
            .code
            .captures(&msg.snippet)
            .map(|caps| caps[1].to_string());
        let body = markup::truncate_chars(&markup::flatten(&msg.snippet), self.max_body_chars);

        Some(Notification::new(
            Self::message_id(msg, occurred_at),
            occurred_at,
            code,
            body,
            self.lifetime,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn extractor() -> StructuredExtractor {
        StructuredExtractor::new(Duration::seconds(300), 400)
    }

    fn api_msg(id: &str, date: Option<&str>, snippet: &str) -> RawMessage {
        let mut headers = Vec::new();
        if let Some(d) = date {
            headers.push(serde_json::json!({ "name": "Date", "value": d }));
        }
        RawMessage::Api(
            serde_json::from_value(serde_json::json!({
                "id": id,
                "snippet": snippet,
                "payload": { "headers": headers }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn extracts_code_from_snippet() {
        let now = Utc::now();
        let msg = api_msg(
            "m-42",
            Some("Tue, 25 Aug 2026 10:00:00 -0500"),
            "Your verification code is 995511. Do not share it.",
        );
        let n = extractor().extract(&msg, now).expect("should extract");
        assert_eq!(n.id, "m-42");
        assert_eq!(n.code.as_deref(), Some("995511"));
        assert_eq!(
            n.occurred_at,
            DateTime::parse_from_rfc2822("Tue, 25 Aug 2026 10:00:00 -0500")
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn no_code_still_yields_notification() {
        let now = Utc::now();
        let msg = api_msg("m-1", None, "A login attempt was blocked.");
        let n = extractor().extract(&msg, now).expect("should extract");
        assert!(n.code.is_none());
        assert_eq!(n.occurred_at, now);
    }

    #[test]
    fn unparsable_date_falls_back_to_now() {
        let now = Utc::now();
        let msg = api_msg("m-2", Some("not a date"), "code 112233 inside");
        let n = extractor().extract(&msg, now).unwrap();
        assert_eq!(n.occurred_at, now);
        assert_eq!(n.code.as_deref(), Some("112233"));
    }

    #[test]
    fn seven_digit_run_is_not_a_code() {
        let now = Utc::now();
        let msg = api_msg("m-3", None, "order 1234567 confirmed");
        let n = extractor().extract(&msg, now).unwrap();
        assert!(n.code.is_none());
    }

    #[test]
    fn first_six_digit_run_wins() {
        let now = Utc::now();
        let msg = api_msg("m-4", None, "codes 111111 and 222222");
        let n = extractor().extract(&msg, now).unwrap();
        assert_eq!(n.code.as_deref(), Some("111111"));
    }

    #[test]
    fn empty_provider_id_gets_deterministic_fallback() {
        let now = Utc::now();
        let msg = api_msg("", Some("Tue, 25 Aug 2026 10:00:00 +0000"), "hello 123456");
        let a = extractor().extract(&msg, now).unwrap();
        let b = extractor().extract(&msg, now).unwrap();
        assert!(!a.id.is_empty());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn rfc822_shaped_message_is_no_match() {
        let now = Utc::now();
        let msg = RawMessage::Rfc822("whatever".into());
        assert!(extractor().extract(&msg, now).is_none());
    }
}
