//! Pattern-scrape extraction strategy.
//!
//! Operates on a flattened (markup-stripped, whitespace-collapsed)
//! rendering of a full RFC 822 message. The verification mail has a
//! fixed shape: a `Welcome to Bambu Lab ... Bambu Lab` envelope
//! bounding the relevant body, a labeled six-digit code, and a
//! `Delivery-date` header whose UTC offset must be honored -- the
//! sender's zone is not ours.

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, trace};

use codewatch_types::Notification;

use crate::markup;

use super::{MessageExtractor, RawMessage};

/// Extractor for scraped RFC 822 message text.
pub struct PatternExtractor {
    lifetime: chrono::Duration,
    max_body_chars: usize,
    envelope: Regex,
    code: Regex,
    delivery_date: Regex,
    message_id: Regex,
}

impl PatternExtractor {
    /// Create an extractor producing notifications with the given
    /// lifetime and body bound.
    pub fn new(lifetime: chrono::Duration, max_body_chars: usize) -> Self {
        Self {
            lifetime,
            max_body_chars,
            envelope: Regex::new(r"Welcome to Bambu Lab[\s\S]*Bambu Lab").unwrap(),
            code: Regex::new(r"Your verification code is:\s*(\d{6})").unwrap(),
            delivery_date: Regex::new(
                r"Delivery-date:\s*[A-Za-z]{3},\s*(\d{2} [A-Za-z]{3} \d{4} \d{2}:\d{2}:\d{2} [+-]\d{4})",
            )
            .unwrap(),
            message_id: Regex::new(r"(?i)Message-ID:\s*<([^>\s]+)>").unwrap(),
        }
    }

    /// Stable id for the message: the `Message-ID` header when present,
    /// otherwise derived from the delivery timestamp. Sequence numbers
    /// are deliberately not used -- they shift across reconnects and
    /// would defeat dedup. Takes the raw text: flattening strips the
    /// angle-bracketed id along with the markup.
    fn message_id(&self, raw: &str, occurred_at: DateTime<Utc>) -> String {
        if let Some(caps) = self.message_id.captures(raw) {
            return caps[1].to_string();
        }
        format!("delivery-{}", occurred_at.timestamp_millis())
    }
}

impl MessageExtractor for PatternExtractor {
    fn extract(&self, msg: &RawMessage, now: DateTime<Utc>) -> Option<Notification> {
        let RawMessage::Rfc822(raw) = msg else {
            return None;
        };
        let text = markup::flatten(raw);

        // Every step below may legitimately fail: most mail, even from
        // the trusted sender, is not a verification mail.
        let envelope = self.envelope.find(&text)?.as_str();
        let code = self.code.captures(&text)?[1].to_string();

        let date_str = &self.delivery_date.captures(&text)?[1];
        let occurred_at = DateTime::parse_from_str(date_str, "%d %b %Y %H:%M:%S %z")
            .map_err(|e| {
                debug!(error = %e, "unparsable delivery date");
                e
            })
            .ok()?
            .with_timezone(&Utc);

        // An already-expired code is not worth surfacing.
        if now - occurred_at >= self.lifetime {
            trace!("matched code already older than its lifetime, skipping");
            return None;
        }

        Some(Notification::new(
            self.message_id(raw, occurred_at),
            occurred_at,
            Some(code),
            markup::truncate_chars(envelope, self.max_body_chars),
            self.lifetime,
        ))
    }
}
