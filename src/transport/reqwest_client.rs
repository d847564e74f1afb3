//! reqwest-backed transport

use super::{ClientFactory, ClientSettings, HttpClient, TransportResponse};
use crate::config::RedirectPolicy;
use crate::error::TransportError;
use crate::redirect;
use crate::types::FetchRequest;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::redirect::Policy;
use std::sync::Arc;

/// Default client factory
///
/// # Examples
///
/// ```
/// use resilient_fetch::config::RedirectPolicy;
/// use resilient_fetch::transport::{ClientFactory, ClientSettings, ReqwestClientFactory};
/// use std::time::Duration;
///
/// let factory = ReqwestClientFactory::new().user_agent("feed-poller/1.0");
/// let client = factory.build(&ClientSettings {
///     timeout: Duration::from_secs(10),
///     on_redirect: RedirectPolicy::Reject,
/// });
/// assert!(client.is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReqwestClientFactory {
    user_agent: Option<String>,
    no_proxy: bool,
}

impl ReqwestClientFactory {
    /// Create a factory with reqwest defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Send this User-Agent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Ignore system proxy settings
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }
}

impl ClientFactory for ReqwestClientFactory {
    fn name(&self) -> &str {
        "standard"
    }

    fn build(&self, settings: &ClientSettings) -> Result<Arc<dyn HttpClient>, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(settings.timeout);

        if settings.on_redirect == RedirectPolicy::Reject {
            builder = builder.redirect(Policy::custom(|attempt| {
                let verdict = redirect::inspect(attempt.url(), attempt.previous());
                match verdict {
                    Ok(()) => attempt.follow(),
                    Err(rejected) => attempt.error(rejected),
                }
            }));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Arc::new(ReqwestClient::new(client)))
    }
}

/// [`HttpClient`] over a `reqwest::Client`
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Wrap an already configured reqwest client
    ///
    /// The caller is responsible for its timeout and redirect policy.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(std::io::Error::other))
            .boxed();

        Ok(TransportResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}
