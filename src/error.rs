//! Error types for resilient-fetch
//!
//! This module provides the error taxonomy of a fetch job:
//! - [`TransportError`] is what a transport reports for a single dispatch
//! - [`Error`] is the terminal failure stored on a [`FetchOutcome`](crate::FetchOutcome)
//! - Machine-readable error codes for callers that branch on failures

use crate::redirect::RedirectRejected;
use reqwest::Method;
use thiserror::Error;

/// Result type alias for resilient-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal failure of a fetch job
///
/// Errors are never thrown across the [`Fetcher::fetch`](crate::Fetcher::fetch)
/// boundary; they are returned inside the outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// The input URL could not be normalized; no network call was made
    #[error("invalid URL {input:?}: {reason}")]
    Parse {
        /// The raw input as supplied by the caller
        input: String,
        /// Why normalization failed
        reason: String,
    },

    /// A redirect was observed while redirects are rejected
    #[error(transparent)]
    RedirectRejected(#[from] RedirectRejected),

    /// A recognized TLS failure on a request that cannot be replayed (POST)
    #[error("TLS failure on {method} request, not retried: {source}")]
    TlsTransient {
        /// Method of the failed request
        method: Method,
        /// The dispatch error carrying the TLS signature
        source: TransportError,
    },

    /// The plain-HTTP fallback failed too; the original failure is surfaced
    #[error("{original}")]
    FallbackFailed {
        /// The error of the first (HTTPS) dispatch
        #[source]
        original: TransportError,
        /// The error of the fallback (HTTP) dispatch, kept for diagnostics
        retry: TransportError,
    },

    /// The transport reported success but delivered no body
    #[error("response with status {status} had no body")]
    EmptyResponse {
        /// Status code of the bodiless response
        status: u16,
    },

    /// Draining the response body failed
    #[error("failed to read response body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// Any other dispatch failure, including clients that could not be built
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Machine-readable error code (e.g. "redirect_rejected", "fallback_failed")
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "parse_error",
            Error::RedirectRejected(_) => "redirect_rejected",
            Error::TlsTransient { .. } => "tls_transient",
            Error::FallbackFailed { .. } => "fallback_failed",
            Error::EmptyResponse { .. } => "empty_response",
            Error::BodyRead(_) => "body_read_error",
            Error::Transport(TransportError::Build(_)) => "client_build_error",
            Error::Transport(_) => "transport_error",
        }
    }

    /// Whether this failure came from the redirect policy
    ///
    /// Callers use this together with the stale-timestamp sentinel on the
    /// outcome to decide that cached content should be refreshed.
    pub fn is_redirect_rejection(&self) -> bool {
        matches!(self, Error::RedirectRejected(_))
    }

    /// The transport error that is reported to the caller, if any
    ///
    /// For [`Error::FallbackFailed`] this is the original error, never the
    /// fallback's.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Error::TlsTransient { source, .. } => Some(source),
            Error::FallbackFailed { original, .. } => Some(original),
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure of a single dispatch as reported by an [`HttpClient`](crate::transport::HttpClient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The redirect inspection callback refused a hop
    #[error(transparent)]
    Redirect(#[from] RedirectRejected),

    /// The request could not be completed (connect, TLS, timeout, protocol)
    ///
    /// The message holds the full error chain so that signatures buried in
    /// nested causes stay visible to classification.
    #[error("{0}")]
    Dispatch(String),

    /// The client itself could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl TransportError {
    /// Build a dispatch error from any error, flattening its source chain
    ///
    /// A [`RedirectRejected`] found anywhere in the chain is preserved as
    /// [`TransportError::Redirect`].
    pub fn from_error_chain(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = String::new();
        let mut current = Some(err);

        while let Some(e) = current {
            if let Some(rejected) = e.downcast_ref::<RedirectRejected>() {
                return TransportError::Redirect(rejected.clone());
            }

            // Some libraries already embed their cause in Display
            let text = e.to_string();
            if !message.contains(&text) {
                if !message.is_empty() {
                    message.push_str(": ");
                }
                message.push_str(&text);
            }
            current = e.source();
        }

        TransportError::Dispatch(message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::from_error_chain(&err)
    }
}
