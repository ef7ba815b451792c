//! Error types for the campus client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Callers branch on [`Error::kind`] rather than matching variants directly:
//! the kind is the stable classification the application uses to decide
//! whether to show a toast, a dialog, or send the user back to the login page.

use crate::auth::AccountState;
use thiserror::Error;

/// The main error type for the campus client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Session Errors
    // ============================================================================
    #[error("Account {state}: {message}")]
    AccountState {
        state: AccountState,
        message: String,
    },

    #[error("Unauthorized after session refresh: {message}")]
    RefreshExhausted { message: String },

    #[error("Session refresh failed: {message}")]
    RefreshFailed { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Network unreachable: {message}")]
    NetworkUnreachable { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Credential Storage Errors
    // ============================================================================
    #[error("Credential store error: {message}")]
    CredentialStore { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    /// Errors from application-side collaborators (custom credential
    /// stores, notifiers, CLI wrappers) that use `anyhow` and convert with `?`
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Classification of an [`Error`] exposed to the application layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 caused by the account itself (pending, rejected, locked, bad password)
    AccountState(AccountState),
    /// 401 on a request that was already replayed once after a refresh
    RefreshExhausted,
    /// The refresh endpoint rejected the session
    RefreshFailed,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 5xx
    ServerError,
    /// Any other 4xx
    BadRequest,
    /// No response was received
    NetworkUnreachable,
    /// Invalid configuration
    Config,
    /// Response body could not be decoded
    Decode,
    /// Local I/O or credential persistence failure
    Io,
    /// Anything else
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an account-state error
    pub fn account_state(state: AccountState, message: impl Into<String>) -> Self {
        Self::AccountState {
            state,
            message: message.into(),
        }
    }

    /// Create a refresh failure error
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::RefreshFailed {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkUnreachable {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a credential store error
    pub fn credential_store(message: impl Into<String>) -> Self {
        Self::CredentialStore {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AccountState { state, .. } => ErrorKind::AccountState(*state),
            Error::RefreshExhausted { .. } => ErrorKind::RefreshExhausted,
            Error::RefreshFailed { .. } => ErrorKind::RefreshFailed,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::HttpStatus { .. } => ErrorKind::BadRequest,
            Error::NetworkUnreachable { .. } | Error::Timeout { .. } => {
                ErrorKind::NetworkUnreachable
            }
            Error::Config { .. } | Error::YamlParse(_) | Error::InvalidUrl(_) => ErrorKind::Config,
            Error::JsonParse(_) | Error::Decode { .. } => ErrorKind::Decode,
            Error::CredentialStore { .. } | Error::Io(_) => ErrorKind::Io,
            Error::Other(_) | Error::Anyhow(_) => ErrorKind::Other,
        }
    }

    /// HTTP status carried by this error, if it came from a server response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Forbidden { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::Conflict { .. } => Some(409),
            Error::ServerError { status, .. } | Error::HttpStatus { status, .. } => Some(*status),
            Error::AccountState { .. } | Error::RefreshExhausted { .. } => Some(401),
            _ => None,
        }
    }

    /// Whether the user has to sign in again
    pub fn is_session_terminal(&self) -> bool {
        match self {
            Error::RefreshFailed { .. } => true,
            Error::AccountState { state, .. } => state.clears_credential(),
            _ => false,
        }
    }
}

/// Result type alias for the campus client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::account_state(AccountState::Locked, "Account is locked");
        assert_eq!(err.to_string(), "Account locked: Account is locked");

        let err = Error::ServerError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 500: boom");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::refresh_failed("expired").kind(),
            ErrorKind::RefreshFailed
        );
        assert_eq!(
            Error::account_state(AccountState::PendingApproval, "").kind(),
            ErrorKind::AccountState(AccountState::PendingApproval)
        );
        assert_eq!(
            Error::Timeout { timeout_ms: 30_000 }.kind(),
            ErrorKind::NetworkUnreachable
        );
        assert_eq!(
            Error::HttpStatus {
                status: 422,
                message: String::new()
            }
            .kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            Error::Forbidden {
                message: String::new()
            }
            .status(),
            Some(403)
        );
        assert_eq!(
            Error::RefreshExhausted {
                message: String::new()
            }
            .status(),
            Some(401)
        );
        assert_eq!(Error::network("down").status(), None);
    }

    #[test]
    fn test_is_session_terminal() {
        assert!(Error::refresh_failed("x").is_session_terminal());
        assert!(Error::account_state(AccountState::Locked, "").is_session_terminal());
        assert!(Error::account_state(AccountState::Rejected, "").is_session_terminal());
        assert!(!Error::account_state(AccountState::InvalidCredentials, "").is_session_terminal());
        assert!(!Error::network("x").is_session_terminal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_anyhow_conversion() {
        fn load() -> anyhow::Result<()> {
            anyhow::bail!("keychain unavailable")
        }

        let err: Error = load().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.to_string(), "keychain unavailable");
    }
}
