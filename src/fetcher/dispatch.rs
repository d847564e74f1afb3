//! Transport selection, dispatch and the single http fallback

use super::Fetcher;
use crate::classify::{Classify, FailureKind};
use crate::config::{FetchConfig, Protocol, RedirectPolicy};
use crate::environment::derive_context_guarded;
use crate::error::{Error, TransportError};
use crate::redirect::RedirectRejected;
use crate::transport::{ClientSettings, HttpClient, TransportResponse};
use crate::types::{ContextToken, Diagnostics, FetchRequest};
use reqwest::Method;
use std::sync::Arc;

impl Fetcher {
    /// Pick the client for this job
    ///
    /// A context token selects the environment's transport, provided a
    /// context can be derived from it; otherwise the standard factory is
    /// used. Development environments get plain http unless the job forces
    /// https.
    pub(super) fn select_client(
        &self,
        context: Option<&ContextToken>,
        config: &FetchConfig,
        request: &mut FetchRequest,
        diagnostics: &mut Diagnostics,
    ) -> Result<Arc<dyn HttpClient>, TransportError> {
        let settings = ClientSettings {
            timeout: config.effective_timeout(),
            on_redirect: config.on_redirect,
        };

        let derived = context.and_then(|token| {
            match derive_context_guarded(self.environment.as_ref(), token) {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    tracing::warn!(error = %e, "no execution context, using standard client");
                    diagnostics.record(format!("execution context unavailable: {e}"));
                    None
                }
            }
        });

        let factory = match &derived {
            Some(ctx) => {
                let factory = self.environment.client_factory(ctx);
                diagnostics.record(format!("{} client ({})", factory.name(), ctx.runtime));

                if self.environment.is_dev_environment()
                    && !config.force_https
                    && request.set_scheme(Protocol::Http.as_str())
                {
                    diagnostics.record("development environment, using http");
                }
                factory
            }
            None => {
                let factory = self.client_factory.clone();
                diagnostics.record(format!("{} client", factory.name()));
                factory
            }
        };

        factory.build(&settings)
    }

    /// Dispatch `request`, falling back to http once after a recognized TLS
    /// failure on a GET
    ///
    /// On return `request` reflects what was sent last.
    pub(super) async fn dispatch(
        &self,
        client: &dyn HttpClient,
        request: &mut FetchRequest,
        config: &FetchConfig,
        has_context: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<TransportResponse, Error> {
        let rejects_redirects = config.on_redirect == RedirectPolicy::Reject;

        let first = match client.execute(request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let kind = first.failure_kind();
        if rejects_redirects && kind == FailureKind::RedirectRejected {
            diagnostics.record("first call failed due to redirect");
            return Err(redirect_error(first));
        }

        let signature = match kind {
            FailureKind::TlsTransient(signature)
                if request.scheme() == Protocol::Https.as_str() =>
            {
                signature
            }
            _ => {
                diagnostics.record(format!("request failed: {first}"));
                return Err(Error::Transport(first));
            }
        };

        if request.method == Method::POST {
            // The body has been handed to the transport once; it is not replayed
            tracing::warn!(url = %request.url, ?signature, "TLS failure on POST, no fallback");
            diagnostics.record(format!(
                "cannot fall back to http for POST after {signature:?}: {first}"
            ));
            if !has_context {
                diagnostics.record("no execution context token was supplied");
            }
            return Err(Error::TlsTransient {
                method: Method::POST,
                source: first,
            });
        }

        if request.method != Method::GET || !request.set_scheme(Protocol::Http.as_str()) {
            diagnostics.record(format!("request failed: {first}"));
            return Err(Error::Transport(first));
        }

        tracing::warn!(url = %request.url, ?signature, "TLS failure, falling back to http");

        match client.execute(request).await {
            Ok(response) => {
                tracing::info!(url = %request.url, "fallback to http succeeded");
                diagnostics.record(format!(
                    "successful fallback to http {} after {}",
                    request.url, first
                ));
                Ok(response)
            }
            Err(retry) => {
                if rejects_redirects && retry.failure_kind() == FailureKind::RedirectRejected {
                    diagnostics.record("GET fallback failed due to redirect");
                    return Err(redirect_error(retry));
                }
                diagnostics.record(format!("GET fallback to http failed with {retry}"));
                Err(Error::FallbackFailed {
                    original: first,
                    retry,
                })
            }
        }
    }
}

/// Surface a redirect-classified transport error as [`Error::RedirectRejected`]
fn redirect_error(err: TransportError) -> Error {
    match err {
        TransportError::Redirect(rejected) => Error::RedirectRejected(rejected),
        TransportError::Dispatch(msg) => match RedirectRejected::from_message(&msg) {
            Some(rejected) => Error::RedirectRejected(rejected),
            None => Error::Transport(TransportError::Dispatch(msg)),
        },
        other => Error::Transport(other),
    }
}
