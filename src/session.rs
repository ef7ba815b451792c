//! Session operations
//!
//! Login, registration and logout. The login and register endpoints are on
//! the refresh exclusion list, so a 401 from them is surfaced as an
//! account-state error instead of starting a refresh.

use crate::auth::{extract_jsonpath, Credential};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestDescriptor};
use serde_json::Value;
use tracing::{info, warn};

impl HttpClient {
    /// Sign in and store the returned access token
    ///
    /// Returns the full login response body so the caller can read the
    /// user's role and profile.
    pub async fn login(&self, credentials: Value) -> Result<Value> {
        let endpoint = self.config().endpoints.login.clone();
        let body: Value = self.post_json(&endpoint, credentials).await?;

        let token_field = &self.config().token_field;
        let token = extract_jsonpath(&body, token_field)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::decode(format!("Login response has no '{token_field}'")))?;

        self.set_credential(Credential::new(token)).await?;
        info!("Signed in");
        Ok(body)
    }

    /// Create an account
    pub async fn register(&self, profile: Value) -> Result<Value> {
        let endpoint = self.config().endpoints.register.clone();
        let response = self
            .request(RequestDescriptor::post(endpoint).json(profile))
            .await?;
        if response.text().trim().is_empty() {
            return Ok(Value::Null);
        }
        response.json()
    }

    /// Sign out
    ///
    /// The server-side logout call is best effort; the local credential is
    /// always cleared.
    pub async fn logout(&self) -> Result<()> {
        if let Some(endpoint) = self.config().endpoints.logout.clone() {
            if let Err(e) = self.request(RequestDescriptor::post(endpoint)).await {
                warn!(error = %e, "Server-side logout failed");
            }
        }

        self.credential_store().clear().await?;
        info!("Signed out");
        Ok(())
    }
}
