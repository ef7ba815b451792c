//! Request descriptors
//!
//! A descriptor is everything needed to issue (and later replay) one call.

use crate::types::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// One HTTP call as issued by the application
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, or an absolute URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override the transport timeout for this request
    pub timeout: Option<Duration>,
    /// Set once the request has been replayed after a refresh
    pub(crate) is_retry: bool,
}

impl RequestDescriptor {
    /// Create a request descriptor
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: HashMap::new(),
            body: None,
            timeout: None,
            is_retry: false,
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// PUT request
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// PATCH request
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// DELETE request
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether this request already went through a refresh replay
    pub fn is_retry(&self) -> bool {
        self.is_retry
    }

    /// Copy of this descriptor marked as a replay
    pub(crate) fn as_retry(&self) -> Self {
        let mut retry = self.clone();
        retry.is_retry = true;
        retry
    }
}
