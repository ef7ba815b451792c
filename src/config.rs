//! Client configuration
//!
//! The configuration is usually loaded from YAML:
//!
//! ```yaml
//! base_url: https://lms.example.edu/api
//! timeout_secs: 30
//! endpoints:
//!   login: /public/auth/login
//!   register: /public/auth/register
//!   refresh: /public/auth/refresh-token
//!   logout: /auth/logout
//! token_field: accessToken
//! account_states:
//!   - pattern: "waiting for (teacher|admin)"
//!     state: pending_approval
//! ```

use crate::auth::{default_rules, AccountStateRule, RuleClassifier};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// Transport timeout in seconds, applied to every call including refresh
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: HashMap<String, String>,

    /// Session endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// URL substrings that never trigger a refresh.
    /// Defaults to the login, register and refresh endpoints.
    #[serde(default)]
    pub excluded_endpoints: Option<Vec<String>>,

    /// Path of the access token in login/refresh responses
    #[serde(default = "default_token_field")]
    pub token_field: String,

    /// Account-state classification rules, in match order
    #[serde(default = "default_rules")]
    pub account_states: Vec<AccountStateRule>,

    /// Keep cookies between calls (carries the HTTP-only refresh cookie)
    #[serde(default = "default_true")]
    pub cookie_store: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("campus-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_token_field() -> String {
    "accessToken".to_string()
}

fn default_true() -> bool {
    true
}

/// Session endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Login endpoint
    #[serde(default = "default_login")]
    pub login: String,

    /// Registration endpoint
    #[serde(default = "default_register")]
    pub register: String,

    /// Token refresh endpoint
    #[serde(default = "default_refresh")]
    pub refresh: String,

    /// Optional server-side logout endpoint
    #[serde(default)]
    pub logout: Option<String>,
}

fn default_login() -> String {
    "/public/auth/login".to_string()
}

fn default_register() -> String {
    "/public/auth/register".to_string()
}

fn default_refresh() -> String {
    "/public/auth/refresh-token".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            login: default_login(),
            register: default_register(),
            refresh: default_refresh(),
            logout: None,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            default_headers: HashMap::new(),
            endpoints: EndpointConfig::default(),
            excluded_endpoints: None,
            token_field: default_token_field(),
            account_states: default_rules(),
            cookie_store: true,
        }
    }

    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check the config for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }
        if self.token_field.trim().is_empty() {
            return Err(Error::config("token_field must not be empty"));
        }
        RuleClassifier::from_rules(&self.account_states)?;
        Ok(())
    }

    /// Transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective refresh exclusion list
    pub fn exclusions(&self) -> Vec<String> {
        self.excluded_endpoints.clone().unwrap_or_else(|| {
            vec![
                self.endpoints.login.clone(),
                self.endpoints.register.clone(),
                self.endpoints.refresh.clone(),
            ]
        })
    }

    /// Resolve a path against the base URL
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Replace the session endpoints
    pub fn endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Override the refresh exclusion list
    pub fn excluded_endpoints(mut self, excluded: Vec<String>) -> Self {
        self.config.excluded_endpoints = Some(excluded);
        self
    }

    /// Set the token path in login/refresh responses
    pub fn token_field(mut self, field: impl Into<String>) -> Self {
        self.config.token_field = field.into();
        self
    }

    /// Replace the account-state rules
    pub fn account_states(mut self, rules: Vec<AccountStateRule>) -> Self {
        self.config.account_states = rules;
        self
    }

    /// Enable or disable the cookie store
    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.config.cookie_store = enabled;
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccountState;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = ClientConfig::from_yaml_str("base_url: https://lms.example.edu/api").unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.endpoints, EndpointConfig::default());
        assert_eq!(config.token_field, "accessToken");
        assert_eq!(config.account_states, default_rules());
        assert!(config.cookie_store);
        assert_eq!(
            config.exclusions(),
            vec![
                "/public/auth/login".to_string(),
                "/public/auth/register".to_string(),
                "/public/auth/refresh-token".to_string(),
            ]
        );
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
base_url: http://localhost:8080
timeout_secs: 5
default_headers:
  X-School: north
endpoints:
  login: /auth/sign-in
  refresh: /auth/renew
  logout: /auth/sign-out
excluded_endpoints:
  - /auth/
token_field: data.token
account_states:
  - pattern: "waiting"
    state: pending_approval
cookie_store: false
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_headers.get("X-School").unwrap(), "north");
        assert_eq!(config.endpoints.login, "/auth/sign-in");
        assert_eq!(config.endpoints.register, "/public/auth/register");
        assert_eq!(config.endpoints.logout.as_deref(), Some("/auth/sign-out"));
        assert_eq!(config.exclusions(), vec!["/auth/".to_string()]);
        assert_eq!(config.token_field, "data.token");
        assert_eq!(
            config.account_states,
            vec![AccountStateRule::new("waiting", AccountState::PendingApproval)]
        );
        assert!(!config.cookie_store);
    }

    #[test]
    fn test_validation_errors() {
        let err = ClientConfig::from_yaml_str("base_url: not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::from_yaml_str("base_url: ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let err =
            ClientConfig::from_yaml_str("base_url: https://example.com\ntimeout_secs: 0").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        let err = ClientConfig::builder("https://example.com")
            .account_states(vec![AccountStateRule::new("[", AccountState::Locked)])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder("https://example.com/api/")
            .timeout(Duration::from_secs(10))
            .header("X-Custom", "value")
            .user_agent("test-agent/1.0")
            .token_field("token")
            .cookie_store(false)
            .build()
            .unwrap();

        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.default_headers.get("X-Custom").unwrap(), "value");
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.token_field, "token");
        assert!(!config.cookie_store);
    }

    #[test]
    fn test_build_url() {
        let config = ClientConfig::new("https://example.com/api/");
        assert_eq!(
            config.build_url("/students"),
            "https://example.com/api/students"
        );
        assert_eq!(config.build_url("quizzes/1"), "https://example.com/api/quizzes/1");
        assert_eq!(
            config.build_url("http://other.example.com/x"),
            "http://other.example.com/x"
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.yaml");
        std::fs::write(&path, "base_url: https://example.com\ntimeout_secs: 7\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.timeout_secs, 7);

        let err = ClientConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
