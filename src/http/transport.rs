//! HTTP transport
//!
//! The client core never talks to the network directly. It hands a fully
//! resolved [`TransportRequest`] to a [`Transport`] and gets back either a
//! [`Response`] (any status) or a [`TransportError`] when no response was
//! received at all.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::Method;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::debug;

/// A request ready to go on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Headers, including `Authorization` when a credential is attached
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub query: HashMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
    /// Per-request timeout override
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Look up a header case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response of any status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    /// Create a response; header names are stored lowercase
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a response with a JSON body
    pub fn json_body(status: u16, body: &Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(status, headers, body.to_string())
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::decode(format!("Invalid JSON in {} response: {e}", self.status))
        })
    }
}

/// No response was received
#[derive(ThisError, Debug)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(timeout) => Error::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
            other => Error::network(other.to_string()),
        }
    }
}

/// Sends requests over the network
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever the server answered
    async fn send(&self, request: TransportRequest) -> std::result::Result<Response, TransportError>;
}

/// [`Transport`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport from the client config
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .cookie_store(config.cookie_store)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<Response, TransportError> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let mut req = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| classify_reqwest(&e, timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest(&e, timeout))?;

        debug!("{} {} -> {}", request.method, request.url, status);
        Ok(Response::new(status, headers, body))
    }
}

fn classify_reqwest(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
