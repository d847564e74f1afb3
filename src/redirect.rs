//! Redirect inspection for jobs that reject redirects
//!
//! With [`RedirectPolicy::Reject`](crate::config::RedirectPolicy::Reject) every
//! redirect hop is passed to [`inspect`]. Exactly one shape is tolerated: a
//! single hop from `/path` to `/path/` (a directory-style redirect). Anything
//! else fails with [`RedirectRejected`], whose message starts with
//! [`REDIRECT_CANCELLED`] and lists the visited paths.

use std::fmt;
use url::Url;

/// Marker carried by every redirect rejection message
pub const REDIRECT_CANCELLED: &str = "redirect cancelled";

/// Sentinel error raised by the redirect inspection callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRejected {
    chain: Vec<String>,
}

impl RedirectRejected {
    /// Create a rejection from the visited paths, ending with the refused target
    pub fn new(chain: Vec<String>) -> Self {
        Self { chain }
    }

    /// Paths of the redirect chain, original request first
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Recover a rejection from its rendered message
    ///
    /// Used for transports that only report error text. Returns `None` when
    /// the message does not carry [`REDIRECT_CANCELLED`].
    pub fn from_message(message: &str) -> Option<Self> {
        let (_, rest) = message.split_once(REDIRECT_CANCELLED)?;
        let chain = rest
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('/'))
            .map(str::to_string)
            .collect();
        Some(Self { chain })
    }
}

impl fmt::Display for RedirectRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", REDIRECT_CANCELLED)?;
        writeln!(f)?;
        for path in &self.chain {
            writeln!(f, "{}", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for RedirectRejected {}

/// Decide whether the redirect to `next` may be followed
///
/// `previous` holds the URLs already requested in this chain, the original
/// request first.
pub fn inspect(next: &Url, previous: &[Url]) -> Result<(), RedirectRejected> {
    if let [original] = previous
        && next.path() == format!("{}/", original.path())
    {
        // /docs -> /docs/
        return Ok(());
    }

    let chain = previous
        .iter()
        .map(|url| url.path().to_string())
        .chain(std::iter::once(next.path().to_string()))
        .collect();

    Err(RedirectRejected::new(chain))
}
