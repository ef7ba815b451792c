//! Credential types
//!
//! A credential is the opaque bearer token handed out by the login and
//! refresh endpoints. The client never inspects it beyond attaching it to
//! outgoing requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Bearer credential for the current session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The access token
    token: String,
    /// When the token was obtained (login or refresh)
    obtained_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential obtained now
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: Utc::now(),
        }
    }

    /// Create a credential with an explicit acquisition time
    pub fn with_obtained_at(token: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            obtained_at,
        }
    }

    /// The raw token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// When the token was obtained
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Time elapsed since the token was obtained
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.obtained_at
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Extract a string from JSON using a simple dotted path
/// Supports basic paths like "$.data.accessToken" or "accessToken"
pub fn extract_jsonpath(value: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_credential_bearer() {
        let credential = Credential::new("abc");
        assert_eq!(credential.token(), "abc");
        assert_eq!(credential.bearer(), "Bearer abc");
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = Credential::new("super-secret");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_credential_age() {
        let earlier = Utc::now() - chrono::Duration::seconds(120);
        let credential = Credential::with_obtained_at("t", earlier);
        assert!(credential.age() >= chrono::Duration::seconds(120));
    }
}
