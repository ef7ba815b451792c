//! HTTP client module
//!
//! Provides the session-aware HTTP client and the pieces it is built from.
//!
//! # Features
//!
//! - **Credential attachment**: `Authorization: Bearer <token>` on every call
//! - **Single-flight refresh**: one refresh call per episode, however many
//!   requests hit 401 while it is in flight
//! - **FIFO replay**: parked requests are replayed once, in arrival order
//! - **Classified errors**: every failure carries an [`ErrorKind`](crate::ErrorKind)
//! - **Pluggable transport**: reqwest by default, anything implementing
//!   [`Transport`] otherwise

mod classify;
mod client;
mod refresh;
mod request;
mod transport;

pub use classify::server_message;
pub use client::{HttpClient, HttpClientBuilder};
pub use refresh::{PendingRequest, RefreshCoordinator, Role};
pub use request::RequestDescriptor;
pub use transport::{ReqwestTransport, Response, Transport, TransportError, TransportRequest};
