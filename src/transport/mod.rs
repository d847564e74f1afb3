//! HTTP transport abstraction
//!
//! The fetch state machine never talks to an HTTP library directly. It asks a
//! [`ClientFactory`] for an [`HttpClient`] configured with the job's
//! [`ClientSettings`] and dispatches through it.
//!
//! ## Architecture
//!
//! - [`ReqwestClientFactory`]: default transport built on `reqwest`
//! - environment-specific factories come from
//!   [`HostEnvironment::client_factory`](crate::environment::HostEnvironment::client_factory)
//!
//! A factory that honors [`RedirectPolicy::Reject`] must run every redirect
//! hop through [`redirect::inspect`](crate::redirect::inspect) and report a
//! refusal as [`TransportError::Redirect`].

mod reqwest_client;

pub use reqwest_client::{ReqwestClient, ReqwestClientFactory};

use crate::config::RedirectPolicy;
use crate::error::TransportError;
use crate::types::FetchRequest;
use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

/// Streamed response body
///
/// Dropping the stream releases the underlying connection resources.
pub type BodyStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

/// Settings a client must apply to every dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Total request timeout, enforced by the client
    pub timeout: Duration,
    /// Redirect handling
    pub on_redirect: RedirectPolicy,
}

/// Response head plus an unread body
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Body stream; `None` when the transport produced no body at all
    pub body: Option<BodyStream>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// A configured HTTP client
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send `request` and return the response head
    ///
    /// Any failure before the response head arrives, including timeouts and
    /// refused redirects, is reported as a [`TransportError`].
    async fn execute(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError>;
}

/// Builds clients for a given set of settings
pub trait ClientFactory: Send + Sync {
    /// Short name recorded in diagnostics (e.g. "standard")
    fn name(&self) -> &str;

    /// Build a client applying `settings`
    fn build(&self, settings: &ClientSettings) -> Result<Arc<dyn HttpClient>, TransportError>;
}
