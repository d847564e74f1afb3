//! Configuration types for resilient-fetch

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// Timeout applied when a job leaves it unset or zero
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(35);

/// Per-job fetch configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total request timeout; zero means [`DEFAULT_TIMEOUT`]
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// What to do when the server answers with a redirect (default: follow)
    #[serde(default)]
    pub on_redirect: RedirectPolicy,

    /// Force the request scheme, e.g. "http", "https" or "https:"
    ///
    /// Any other value is ignored.
    #[serde(default)]
    pub force_protocol: Option<String>,

    /// Keep https even when a development environment would downgrade it
    #[serde(default)]
    pub force_https: bool,

    /// Diagnostic verbosity; values above 0 add URL tracing lines
    #[serde(default)]
    pub log_level: u8,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            on_redirect: RedirectPolicy::default(),
            force_protocol: None,
            force_https: false,
            log_level: 0,
        }
    }
}

impl FetchConfig {
    /// The timeout to hand to the client
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// The forced protocol, if one is configured and valid
    ///
    /// A trailing colon is trimmed, so "https:" yields [`Protocol::Https`].
    pub fn forced_protocol(&self) -> Option<Protocol> {
        let raw = self.force_protocol.as_deref()?;
        if raw.len() <= 1 {
            return None;
        }
        raw.strip_suffix(':').unwrap_or(raw).parse().ok()
    }
}

/// Redirect handling policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPolicy {
    /// Follow redirects normally (code 0)
    #[default]
    Follow,
    /// Treat any redirect as a hard failure, except a single `/path` to
    /// `/path/` hop (code 1)
    Reject,
}

impl RedirectPolicy {
    /// Map the numeric policy code (0 = follow, 1 = reject)
    ///
    /// Unknown codes follow redirects.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => RedirectPolicy::Reject,
            _ => RedirectPolicy::Follow,
        }
    }
}

/// Request scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl Protocol {
    /// Scheme string as used in URLs
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(format!("unsupported protocol {other:?}")),
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
