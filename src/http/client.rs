//! Session-aware HTTP client
//!
//! Provides the client every API wrapper goes through. It handles:
//! - Attaching the bearer credential to outgoing requests
//! - Classifying error responses into [`ErrorKind`](crate::ErrorKind)s
//! - Single-flight session refresh with FIFO replay of parked requests
//! - Dropping the credential and notifying the application when the
//!   session cannot be recovered

use super::classify::{classify, clears_credential, server_message, Disposition};
use super::refresh::{PendingRequest, RefreshCoordinator, Role};
use super::request::RequestDescriptor;
use super::transport::{ReqwestTransport, Response, Transport, TransportRequest};
use crate::auth::{
    extract_jsonpath, AccountState, AccountStateClassifier, Credential, CredentialStore,
    InMemoryCredentialStore, NoopNotifier, RuleClassifier, SessionExpiredNotifier,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::Method;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for [`HttpClient`]
///
/// Every collaborator is optional; the defaults are a reqwest transport,
/// an in-memory credential store, the config's account-state rules and a
/// notifier that does nothing.
pub struct HttpClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    classifier: Option<Arc<dyn AccountStateClassifier>>,
    notifier: Option<Arc<dyn SessionExpiredNotifier>>,
}

impl HttpClientBuilder {
    /// Use a custom transport
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a custom credential store
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom account-state classifier
    pub fn classifier(mut self, classifier: impl AccountStateClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Use a custom session notifier
    pub fn notifier(mut self, notifier: impl SessionExpiredNotifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Validate the config and build the client
    pub fn build(self) -> Result<HttpClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        let classifier: Arc<dyn AccountStateClassifier> = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::new(RuleClassifier::from_rules(&self.config.account_states)?),
        };

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                exclusions: self.config.exclusions(),
                config: self.config,
                transport,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new())),
                classifier,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
                coordinator: Arc::default(),
            }),
        })
    }
}

struct ClientInner {
    config: ClientConfig,
    exclusions: Vec<String>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    classifier: Arc<dyn AccountStateClassifier>,
    notifier: Arc<dyn SessionExpiredNotifier>,
    coordinator: Arc<RefreshCoordinator>,
}

/// HTTP client with credential attachment and session refresh
///
/// Cloning is cheap; clones share the credential store and the refresh
/// coordinator.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    /// Create a client with default collaborators
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create a client builder
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder {
            config,
            transport: None,
            store: None,
            classifier: None,
            notifier: None,
        }
    }

    /// The client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The credential store
    pub fn credential_store(&self) -> &dyn CredentialStore {
        self.inner.store.as_ref()
    }

    /// The refresh coordinator
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(RequestDescriptor::get(url)).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.request(RequestDescriptor::post(url).json(body)).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Value) -> Result<Response> {
        self.request(RequestDescriptor::put(url).json(body)).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, body: Value) -> Result<Response> {
        self.request(RequestDescriptor::patch(url).json(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(RequestDescriptor::delete(url)).await
    }

    /// Make a request and parse the JSON response
    pub async fn request_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        self.request(request).await?.json()
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request_json(RequestDescriptor::get(url)).await
    }

    /// Make a POST request and parse the JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<T> {
        self.request_json(RequestDescriptor::post(url).json(body))
            .await
    }

    /// Issue a request
    ///
    /// Successful (2xx) responses come back unchanged. An eligible 401 parks
    /// the request behind the current refresh episode (starting one if
    /// needed) and resolves with the outcome of its single replay.
    pub async fn request(&self, request: RequestDescriptor) -> Result<Response> {
        let credential = self.inner.store.get().await;

        match self.attempt(&request, credential.as_ref()).await {
            Disposition::Success(response) => Ok(response),
            Disposition::Failed(error) => Err(error),
            Disposition::RefreshRequired => self.join_refresh(request, credential).await,
        }
    }

    /// Send once and classify the answer
    async fn attempt(
        &self,
        request: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Disposition {
        debug!(
            method = %request.method,
            url = %request.url,
            retry = request.is_retry(),
            authenticated = credential.is_some(),
            "Dispatching request"
        );

        let response = match self
            .inner
            .transport
            .send(self.transport_request(request, credential))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "No response received");
                return Disposition::Failed(e.into());
            }
        };

        let disposition = classify(
            response,
            request,
            &self.inner.exclusions,
            self.inner.classifier.as_ref(),
        );

        let cleared = match &disposition {
            Disposition::Failed(error) => clears_credential(error),
            _ => None,
        };
        if let Some(state) = cleared {
            self.drop_credential(state).await;
        }

        disposition
    }

    fn transport_request(
        &self,
        request: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> TransportRequest {
        let mut headers = self.inner.config.default_headers.clone();
        headers.extend(request.headers.clone());

        if let Some(credential) = credential {
            headers.retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
            headers.insert("Authorization".to_string(), credential.bearer());
        }

        TransportRequest {
            method: request.method,
            url: self.inner.config.build_url(&request.url),
            headers,
            query: request.query.clone(),
            body: request.body.clone(),
            timeout: request.timeout,
        }
    }

    /// Join (or open) the refresh episode and wait for this request's replay
    async fn join_refresh(
        &self,
        request: RequestDescriptor,
        sent_with: Option<Credential>,
    ) -> Result<Response> {
        // A refresh finished while this request was in flight
        if !self.inner.coordinator.is_refreshing() {
            if let Some(current) = self.inner.store.get().await {
                if sent_with.as_ref().map(Credential::token) != Some(current.token()) {
                    debug!(url = %request.url, "Credential rotated in flight, replaying");
                    return self.replay(&request, &current).await;
                }
            }
        }

        let url = request.url.clone();
        let (pending, receiver) = PendingRequest::new(request);

        match self.inner.coordinator.enqueue(pending) {
            Role::Leader => {
                debug!(%url, "401 observed, starting session refresh");
                // The episode outlives this caller so queued followers always settle.
                let client = self.clone();
                tokio::spawn(async move { client.run_episode().await });
            }
            Role::Follower => {
                debug!(%url, "401 observed during refresh, queued for replay");
            }
        }

        receiver.await.unwrap_or_else(|_| {
            Err(Error::refresh_failed(
                "refresh episode ended without settling this request",
            ))
        })
    }

    /// Drive one refresh episode to completion
    async fn run_episode(&self) {
        match self.fetch_refreshed_credential().await {
            Ok(credential) => {
                if let Err(e) = self.inner.store.set(credential.clone()).await {
                    warn!(error = %e, "Failed to store refreshed credential");
                }

                let pending = self.inner.coordinator.settle();
                info!(replays = pending.len(), "Session refreshed, replaying requests");

                // join_all polls in order, so replays are dispatched FIFO.
                let credential = &credential;
                join_all(pending.into_iter().map(|pending| async move {
                    let outcome = self.replay(&pending.descriptor, credential).await;
                    pending.settle(outcome);
                }))
                .await;
            }
            Err(message) => {
                warn!(%message, "Session refresh failed, clearing credential");
                if let Err(e) = self.inner.store.clear().await {
                    warn!(error = %e, "Failed to clear credential");
                }

                let pending = self.inner.coordinator.settle();
                for pending in pending {
                    pending.settle(Err(Error::refresh_failed(message.clone())));
                }

                self.inner.notifier.session_expired();
            }
        }
    }

    /// Replay a parked request once with the refreshed credential
    async fn replay(&self, request: &RequestDescriptor, credential: &Credential) -> Result<Response> {
        match self.attempt(&request.as_retry(), Some(credential)).await {
            Disposition::Success(response) => Ok(response),
            Disposition::Failed(error) => Err(error),
            Disposition::RefreshRequired => Err(Error::RefreshExhausted {
                message: "Unauthorized".to_string(),
            }),
        }
    }

    /// Call the refresh endpoint; it authenticates through its own cookie,
    /// never through the expiring bearer token
    async fn fetch_refreshed_credential(&self) -> std::result::Result<Credential, String> {
        let config = &self.inner.config;
        let request = TransportRequest {
            method: Method::POST,
            url: config.build_url(&config.endpoints.refresh),
            headers: config.default_headers.clone(),
            query: Default::default(),
            body: None,
            timeout: None,
        };

        let response = self
            .inner
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!(
                "refresh endpoint returned {}: {}",
                response.status(),
                server_message(&response)
            ));
        }

        let body: Value = response
            .json()
            .map_err(|e| format!("unreadable refresh response: {e}"))?;
        extract_jsonpath(&body, &config.token_field)
            .filter(|token| !token.is_empty())
            .map(Credential::new)
            .ok_or_else(|| format!("refresh response has no '{}'", config.token_field))
    }

    async fn drop_credential(&self, state: AccountState) {
        warn!(%state, "Account cannot be authorized, clearing credential");
        if let Err(e) = self.inner.store.clear().await {
            warn!(error = %e, "Failed to clear credential");
        }
        self.inner.notifier.credential_cleared(state);
    }

    /// Store a credential obtained outside the client (e.g. a restored session)
    pub async fn set_credential(&self, credential: Credential) -> Result<()> {
        self.inner.store.set(credential).await
    }

    /// Current credential, if any
    pub async fn credential(&self) -> Option<Credential> {
        self.inner.store.get().await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .field("refreshing", &self.inner.coordinator.is_refreshing())
            .finish_non_exhaustive()
    }
}
