//! Secret string wrapper for mailbox and API credentials.
//!
//! [`SecretString`] keeps passwords and tokens out of logs, `Debug`
//! output, and serialized config dumps.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A credential value that never appears in logs or serialized output.
///
/// - `Debug` and `Display` print `[REDACTED]` (empty stays empty)
/// - `Serialize` emits an empty string, never the value
/// - `Deserialize` accepts a plain string
/// - [`expose()`](SecretString::expose) returns the inner value where
///   it is actually needed (IMAP login, Authorization headers)
#[derive(Clone, Default)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read a credential from an environment variable. `None` when the
    /// variable is unset or blank.
    pub fn from_env(name: &str) -> Option<Self> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Some(Self(value)),
            _ => None,
        }
    }

    /// The actual secret. Use only at the point of authentication.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no value was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "\"[REDACTED]\"")
        }
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, "[REDACTED]")
        }
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SecretString(String::deserialize(deserializer)?))
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
