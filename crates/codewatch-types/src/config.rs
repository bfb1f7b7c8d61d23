//! Configuration schema.
//!
//! All structs support both `snake_case` and `camelCase` field names in
//! JSON via `#[serde(alias)]`, default every field, and ignore unknown
//! fields for forward compatibility. A `Config::default()` is a
//! runnable (if credential-less) baseline.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CodewatchError;
use crate::secret::SecretString;

/// Root configuration for codewatch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Notification store tunables.
    #[serde(default)]
    pub store: StoreConfig,

    /// IMAP mailbox connection parameters (watch variant).
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// Reconnection policy for the mail connection.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Webhook endpoint and history API settings (serve variant).
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Config {
    /// Validate cross-field constraints not expressible in serde.
    pub fn validate(&self) -> Result<(), CodewatchError> {
        if self.store.capacity == 0 {
            return Err(CodewatchError::ConfigInvalid {
                reason: "store.capacity must be nonzero".into(),
            });
        }
        if self.store.lifetime_secs == 0 {
            return Err(CodewatchError::ConfigInvalid {
                reason: "store.lifetimeSecs must be nonzero".into(),
            });
        }
        if self.store.tick_interval_ms == 0 {
            return Err(CodewatchError::ConfigInvalid {
                reason: "store.tickIntervalMs must be nonzero".into(),
            });
        }
        if self.reconnect.max_retries == 0 {
            return Err(CodewatchError::ConfigInvalid {
                reason: "reconnect.maxRetries must be nonzero".into(),
            });
        }
        Ok(())
    }
}

/// Notification store tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of notifications held at once.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Seconds before a code expires.
    #[serde(default = "default_lifetime_secs", alias = "lifetimeSecs")]
    pub lifetime_secs: u64,

    /// Aging tick cadence in milliseconds.
    #[serde(default = "default_tick_interval_ms", alias = "tickIntervalMs")]
    pub tick_interval_ms: u64,

    /// Maximum characters kept in a notification body.
    #[serde(default = "default_max_body_chars", alias = "maxBodyChars")]
    pub max_body_chars: usize,
}

impl StoreConfig {
    /// Code lifetime as a chrono duration.
    pub fn lifetime(&self) -> Duration {
        Duration::seconds(self.lifetime_secs as i64)
    }

    /// Aging tick cadence as a std duration.
    pub fn tick_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.tick_interval_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            lifetime_secs: default_lifetime_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

/// IMAP mailbox connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// IMAP server hostname.
    #[serde(default)]
    pub host: String,

    /// IMAP server port.
    #[serde(default = "default_imap_port")]
    pub port: u16,

    /// IMAP login principal (usually the email address).
    #[serde(default)]
    pub username: String,

    /// IMAP password. Never logged or re-serialized.
    #[serde(default)]
    pub password: SecretString,

    /// Mailbox folder to watch.
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Trusted sender whose mail is searched for codes.
    #[serde(default = "default_sender")]
    pub sender: String,

    /// How many of the most recent sender matches a sync pass inspects.
    #[serde(default = "default_search_window", alias = "searchWindow")]
    pub search_window: usize,

    /// Periodic self-wake interval for the watch loop, in seconds.
    #[serde(default = "default_wake_interval_secs", alias = "wakeIntervalSecs")]
    pub wake_interval_secs: u64,

    /// Process every new match per sync pass instead of only the
    /// newest one.
    #[serde(default, alias = "processAllNew")]
    pub process_all_new: bool,
}

impl MailboxConfig {
    /// Self-wake interval as a std duration.
    pub fn wake_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.wake_interval_secs)
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_imap_port(),
            username: String::new(),
            password: SecretString::default(),
            folder: default_folder(),
            sender: default_sender(),
            search_window: default_search_window(),
            wake_interval_secs: default_wake_interval_secs(),
            process_all_new: false,
        }
    }
}

/// Reconnection policy for the mail connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Connection attempts before giving up.
    #[serde(default = "default_max_retries", alias = "maxRetries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs", alias = "retryDelaySecs")]
    pub retry_delay_secs: u64,
}

impl ReconnectConfig {
    /// Inter-attempt delay as a std duration.
    pub fn retry_delay(&self) -> StdDuration {
        StdDuration::from_secs(self.retry_delay_secs)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// Webhook endpoint and history API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Socket address the push endpoint binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Base URL of the hosted-mail history API.
    #[serde(default, alias = "apiBaseUrl")]
    pub api_base_url: String,

    /// Environment variable holding the API bearer token.
    #[serde(default = "default_api_token_env", alias = "apiTokenEnv")]
    pub api_token_env: String,

    /// Where the history cursor is persisted. `~/` expands to home.
    #[serde(default = "default_cursor_path", alias = "cursorPath")]
    pub cursor_path: String,

    /// Labels whose messages never reach the extractor.
    #[serde(default = "default_excluded_labels", alias = "excludedLabels")]
    pub excluded_labels: Vec<String>,
}

impl WebhookConfig {
    /// Cursor path with a `~/` prefix expanded to the home directory.
    pub fn cursor_path(&self) -> PathBuf {
        expand_home(&self.cursor_path)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_base_url: String::new(),
            api_token_env: default_api_token_env(),
            cursor_path: default_cursor_path(),
            excluded_labels: default_excluded_labels(),
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

fn default_capacity() -> usize {
    5
}
fn default_lifetime_secs() -> u64 {
    300
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_max_body_chars() -> usize {
    400
}
fn default_imap_port() -> u16 {
    993
}
fn default_folder() -> String {
    "INBOX".into()
}
fn default_sender() -> String {
    "Bambu Lab".into()
}
fn default_search_window() -> usize {
    800
}
fn default_wake_interval_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    20
}
fn default_retry_delay_secs() -> u64 {
    30
}
fn default_bind() -> String {
    "0.0.0.0:8080".into()
}
fn default_api_token_env() -> String {
    "CODEWATCH_API_TOKEN".into()
}
fn default_cursor_path() -> String {
    "~/.codewatch/cursor".into()
}
fn default_excluded_labels() -> Vec<String> {
    vec!["SENT".into(), "DRAFT".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_spec_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.store.capacity, 5);
        assert_eq!(cfg.store.lifetime_secs, 300);
        assert_eq!(cfg.mailbox.search_window, 800);
        assert_eq!(cfg.reconnect.max_retries, 20);
        assert_eq!(cfg.reconnect.retry_delay_secs, 30);
        assert_eq!(cfg.webhook.excluded_labels, vec!["SENT", "DRAFT"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn camel_case_aliases() {
        let json = r#"{
            "store": { "lifetimeSecs": 120, "tickIntervalMs": 500 },
            "mailbox": { "searchWindow": 100, "processAllNew": true },
            "reconnect": { "maxRetries": 3, "retryDelaySecs": 1 }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.store.lifetime_secs, 120);
        assert_eq!(cfg.store.tick_interval_ms, 500);
        assert_eq!(cfg.mailbox.search_window, 100);
        assert!(cfg.mailbox.process_all_new);
        assert_eq!(cfg.reconnect.max_retries, 3);
    }

    #[test]
    fn unknown_fields_ignored() {
        let json = r#"{ "store": { "capacity": 3, "futureKnob": true } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.store.capacity, 3);
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut cfg = Config::default();
        cfg.store.capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn password_not_reserialized() {
        let json = r#"{ "mailbox": { "password": "hunter2" } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mailbox.password.expose(), "hunter2");
        let out = serde_json::to_string(&cfg).unwrap();
        assert!(!out.contains("hunter2"));
    }
}
