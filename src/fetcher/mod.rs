//! The fetch job state machine (decomposed into focused submodules)
//!
//! ```text
//! Start → RequestBuilt → Dispatched → Success
//!                                   → RedirectRejected
//!                                   → TLS failure → retry over http → Success | Failed
//!                                   → other failure
//! ```
//!
//! - `prepare`: URL normalization, default scheme and path, forced protocol
//! - `dispatch`: transport selection, dispatch and the single http fallback
//! - `body`: response draining and `Last-Modified` parsing

mod body;
mod dispatch;
mod prepare;

#[cfg(test)]
mod test_helpers;

use crate::environment::{HostEnvironment, StandaloneEnvironment};
use crate::error::Error;
use crate::normalize::{DefaultNormalizer, UrlNormalizer};
use crate::transport::{ClientFactory, ReqwestClientFactory};
use crate::types::{Diagnostics, FetchJob, FetchOutcome};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Age of the stale-timestamp sentinel set after a redirect rejection
pub const STALE_AFTER_REDIRECT_MINUTES: i64 = 10;

/// Runs fetch jobs
///
/// Collaborators are shared behind `Arc`, so a `Fetcher` is cheap to clone
/// and can serve concurrent jobs.
///
/// # Examples
///
/// ```no_run
/// use resilient_fetch::{FetchJob, Fetcher};
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetcher = Fetcher::new();
/// let outcome = fetcher
///     .fetch(FetchJob::new("example.com/feed.xml").reject_redirects())
///     .await;
///
/// match &outcome.result {
///     Ok(fetched) => println!("{} bytes, status {}", fetched.body().len(), fetched.status),
///     Err(e) if e.is_redirect_rejection() => println!("moved, treat cache as stale"),
///     Err(e) => println!("failed: {e}\n{}", outcome.diagnostics),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct Fetcher {
    client_factory: Arc<dyn ClientFactory>,
    environment: Arc<dyn HostEnvironment>,
    normalizer: Arc<dyn UrlNormalizer>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("client_factory", &self.client_factory.name())
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Fetcher with the reqwest transport, no hosting runtime and the
    /// default URL normalizer
    pub fn new() -> Self {
        Self {
            client_factory: Arc::new(ReqwestClientFactory::new()),
            environment: Arc::new(StandaloneEnvironment::default()),
            normalizer: Arc::new(DefaultNormalizer),
        }
    }

    /// Replace the default (non-environment) client factory
    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.client_factory = factory;
        self
    }

    /// Replace the hosting environment
    pub fn with_environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    /// Replace the URL normalizer
    pub fn with_normalizer(mut self, normalizer: Arc<dyn UrlNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Run one job to completion
    ///
    /// Never fails: every error ends up in [`FetchOutcome::result`], next to
    /// the diagnostics explaining how it came about.
    pub async fn fetch(&self, job: FetchJob) -> FetchOutcome {
        let FetchJob {
            target,
            config,
            context,
        } = job;
        let mut diagnostics = Diagnostics::new(config.log_level);

        let mut request = match self.prepare_request(target, &config, &mut diagnostics) {
            Ok(request) => request,
            Err(err) => {
                return FetchOutcome {
                    request: None,
                    result: Err(err),
                    modified: None,
                    diagnostics,
                };
            }
        };

        let client =
            match self.select_client(context.as_ref(), &config, &mut request, &mut diagnostics) {
                Ok(client) => client,
                Err(err) => {
                    diagnostics.record(format!("could not build client: {err}"));
                    return FetchOutcome {
                        request: Some(request),
                        result: Err(Error::Transport(err)),
                        modified: None,
                        diagnostics,
                    };
                }
            };

        diagnostics.verbose(|| format!("url standardized to {}", request.url));
        tracing::debug!(
            url = %request.url,
            scheme = request.scheme(),
            method = %request.method,
            "dispatching fetch"
        );

        let dispatched = self
            .dispatch(
                client.as_ref(),
                &mut request,
                &config,
                context.is_some(),
                &mut diagnostics,
            )
            .await;

        let (result, modified) = match dispatched {
            Ok(response) => match body::read_response(response).await {
                Ok((fetched, modified)) => (Ok(fetched), modified),
                Err(err) => {
                    diagnostics.record(format!("reading response failed: {err}"));
                    (Err(err), None)
                }
            },
            Err(err) if err.is_redirect_rejection() => (Err(err), Some(stale_timestamp())),
            Err(err) => (Err(err), None),
        };

        FetchOutcome {
            request: Some(request),
            result,
            modified,
            diagnostics,
        }
    }
}

/// "Now" minus [`STALE_AFTER_REDIRECT_MINUTES`]
fn stale_timestamp() -> DateTime<Utc> {
    Utc::now() - Duration::minutes(STALE_AFTER_REDIRECT_MINUTES)
}
