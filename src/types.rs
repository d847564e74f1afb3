//! Core types for resilient-fetch

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::config::{FetchConfig, RedirectPolicy};
use crate::error::Error;
use crate::utils::{PREVIEW_CHARS, ellipsize};

/// Opaque execution-context token handed in by a hosting runtime
///
/// The fetcher never looks inside; it only passes the token to
/// [`HostEnvironment::derive_context`](crate::environment::HostEnvironment::derive_context).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextToken(String);

impl ContextToken {
    /// Create a new ContextToken
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the inner token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for ContextToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Display for ContextToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A caller-built request
///
/// The URL is kept as given; an absent scheme (`//host/path` or
/// `host/path`) is completed with `https` when the job runs.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Target URL, possibly without scheme
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// Create a request with the given method and no body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request with a body
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::new(Method::POST, url)
        }
    }

    /// Add a header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl From<FetchRequest> for RequestSpec {
    fn from(request: FetchRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.to_string(),
            headers: request.headers,
            body: request.body,
        }
    }
}

/// A fully qualified outbound request, as dispatched
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL with normalized scheme and non-empty path
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    /// Create a GET request for an absolute URL
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// The URL scheme
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Replace the scheme; false if the URL refused the change
    pub(crate) fn set_scheme(&mut self, scheme: &str) -> bool {
        self.url.set_scheme(scheme).is_ok()
    }
}

/// What a job fetches
#[derive(Clone, Debug)]
pub enum FetchTarget {
    /// A raw URL string, normalized before use
    Url(String),
    /// A caller-built request; takes precedence over any URL
    Request(RequestSpec),
}

/// One fetch attempt: target plus configuration
///
/// A job is consumed by [`Fetcher::fetch`](crate::Fetcher::fetch) and can
/// therefore run only once.
///
/// # Examples
///
/// ```
/// use resilient_fetch::{FetchJob, config::RedirectPolicy};
/// use std::time::Duration;
///
/// let job = FetchJob::new("example.com/feed.xml")
///     .timeout(Duration::from_secs(10))
///     .reject_redirects()
///     .force_protocol("https:");
/// assert_eq!(job.config.on_redirect, RedirectPolicy::Reject);
/// ```
#[derive(Clone, Debug)]
pub struct FetchJob {
    /// URL or prebuilt request
    pub target: FetchTarget,
    /// Fetch configuration
    pub config: FetchConfig,
    /// Optional execution-context token selecting an environment transport
    pub context: Option<ContextToken>,
}

impl FetchJob {
    /// Create a GET job for a raw URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            target: FetchTarget::Url(url.into()),
            config: FetchConfig::default(),
            context: None,
        }
    }

    /// Create a job for a prebuilt request
    pub fn from_request(request: impl Into<RequestSpec>) -> Self {
        Self {
            target: FetchTarget::Request(request.into()),
            config: FetchConfig::default(),
            context: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the request timeout (zero means the default)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the redirect policy
    pub fn on_redirect(mut self, policy: RedirectPolicy) -> Self {
        self.config.on_redirect = policy;
        self
    }

    /// Reject redirects (except a single directory-style hop)
    pub fn reject_redirects(self) -> Self {
        self.on_redirect(RedirectPolicy::Reject)
    }

    /// Force the request scheme ("http", "https", "https:")
    pub fn force_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.force_protocol = Some(protocol.into());
        self
    }

    /// Keep https in development environments
    pub fn force_https(mut self, force: bool) -> Self {
        self.config.force_https = force;
        self
    }

    /// Set the diagnostic verbosity
    pub fn log_level(mut self, level: u8) -> Self {
        self.config.log_level = level;
        self
    }

    /// Attach an execution-context token
    pub fn context(mut self, token: impl Into<ContextToken>) -> Self {
        self.context = Some(token.into());
        self
    }
}

/// Ordered, append-only diagnostic log of one fetch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    lines: Vec<String>,
    verbose: bool,
}

impl Diagnostics {
    /// Create an empty log; `log_level > 0` enables verbose lines
    pub fn new(log_level: u8) -> Self {
        Self {
            lines: Vec::new(),
            verbose: log_level > 0,
        }
    }

    /// Append a line
    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(diagnostic = %line, "fetch");
        self.lines.push(line);
    }

    /// Append a line only when verbose
    pub fn verbose(&mut self, line: impl FnOnce() -> String) {
        if self.verbose {
            self.record(line());
        }
    }

    /// All lines in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A successfully fetched resource
#[derive(Clone, Debug)]
pub struct Fetched {
    /// HTTP status code (any code; non-2xx is not a failure)
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    body: Vec<u8>,
}

impl Fetched {
    /// Create a new Fetched
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take ownership of the body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Truncated textual preview of the body, for display only
    pub fn preview(&self, max_chars: usize) -> String {
        ellipsize(&String::from_utf8_lossy(&self.body), max_chars)
    }
}

/// Everything a fetch produced
#[derive(Debug)]
pub struct FetchOutcome {
    /// The final resolved request; `None` only if the URL could not be parsed
    pub request: Option<FetchRequest>,
    /// The fetched resource or the terminal error
    pub result: Result<Fetched, Error>,
    /// Parsed `Last-Modified`, or the stale sentinel after a redirect
    /// rejection; `None` is the zero time
    pub modified: Option<DateTime<Utc>>,
    /// Diagnostic log
    pub diagnostics: Diagnostics,
}

impl FetchOutcome {
    /// Whether the fetch succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The terminal error, if any
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// The fetched resource, if any
    pub fn fetched(&self) -> Option<&Fetched> {
        self.result.as_ref().ok()
    }

    /// Status code of a successful fetch
    pub fn status(&self) -> Option<u16> {
        self.fetched().map(|f| f.status)
    }

    /// Body of a successful fetch
    pub fn body(&self) -> Option<&[u8]> {
        self.fetched().map(Fetched::body)
    }

    /// Body preview with the default length; empty on failure
    pub fn preview(&self) -> String {
        self.fetched()
            .map(|f| f.preview(PREVIEW_CHARS))
            .unwrap_or_default()
    }
}
