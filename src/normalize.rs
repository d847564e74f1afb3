//! URL normalization for raw job targets
//!
//! Callers hand in URLs as typed by people or scraped from pages: padded
//! with whitespace, missing a scheme, scheme-relative. The normalizer turns
//! them into absolute `http`/`https` URLs or explains why it cannot.

use std::borrow::Cow;
use url::Url;

/// Structural cleanup of raw URL strings
pub trait UrlNormalizer: Send + Sync {
    /// Normalize `raw` into an absolute URL
    ///
    /// The error string explains why the input was refused.
    fn normalize(&self, raw: &str) -> std::result::Result<Url, String>;
}

/// Default normalizer
///
/// - surrounding whitespace is trimmed
/// - scheme-relative input (`//host/path`) and input without a scheme get `https`
/// - host case and dot segments are normalized by the `url` crate
/// - only `http` and `https` URLs with a host are accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl UrlNormalizer for DefaultNormalizer {
    fn normalize(&self, raw: &str) -> std::result::Result<Url, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty URL".to_string());
        }
        if trimmed.starts_with('/') && !trimmed.starts_with("//") {
            return Err("relative URL without a host".to_string());
        }

        let url = Url::parse(&with_default_scheme(trimmed)).map_err(|e| e.to_string())?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported scheme {other:?}")),
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err("missing host".to_string());
        }

        Ok(url)
    }
}

/// Complete a URL that lacks a scheme with `https`
///
/// Handles both `//host/path` and `host/path`. Input whose `://` comes
/// before the first `/`, `?` or `#` already has a scheme and is returned
/// as is; a `://` further right belongs to the path or query.
pub fn with_default_scheme(raw: &str) -> Cow<'_, str> {
    let authority_end = raw.find(['/', '?', '#']).unwrap_or(raw.len());
    let has_scheme = raw.find("://").is_some_and(|at| at < authority_end);

    if let Some(rest) = raw.strip_prefix("//") {
        Cow::Owned(format!("https://{rest}"))
    } else if has_scheme {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("https://{raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> std::result::Result<String, String> {
        DefaultNormalizer.normalize(raw).map(|u| u.to_string())
    }

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            normalize("https://example.com/a?b=c").unwrap(),
            "https://example.com/a?b=c"
        );
        assert_eq!(normalize("http://example.com").unwrap(), "http://example.com/");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(
            normalize("  \thttps://example.com/x \n").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn missing_scheme_defaults_to_https() {
        assert_eq!(normalize("example.com/page").unwrap(), "https://example.com/page");
        assert_eq!(
            normalize("localhost:8080/status").unwrap(),
            "https://localhost:8080/status"
        );
    }

    #[test]
    fn scheme_relative_gets_https() {
        assert_eq!(
            normalize("//cdn.example.com/lib.js").unwrap(),
            "https://cdn.example.com/lib.js"
        );
    }

    #[test]
    fn url_in_query_does_not_count_as_scheme() {
        assert_eq!(
            normalize("example.com/go?to=http://x.example/").unwrap(),
            "https://example.com/go?to=http://x.example/"
        );
        assert_eq!(
            normalize("127.0.0.1:1/go?to=http://x.example/").unwrap(),
            "https://127.0.0.1:1/go?to=http://x.example/"
        );
        assert_eq!(with_default_scheme("h#frag://x"), "https://h#frag://x");
    }

    #[test]
    fn host_and_dot_segments_are_normalized() {
        assert_eq!(
            normalize("HTTPS://Example.COM/a/../b").unwrap(),
            "https://example.com/b"
        );
    }

    #[test]
    fn default_scheme_only_when_missing() {
        assert_eq!(with_default_scheme("//h/p"), "https://h/p");
        assert_eq!(with_default_scheme("h/p"), "https://h/p");
        assert!(matches!(with_default_scheme("http://h/p"), Cow::Borrowed("http://h/p")));
    }

    #[test]
    fn invalid_inputs_are_refused() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize("/just/a/path").is_err());
        assert!(normalize("ftp://example.com/file").is_err());
        assert!(normalize("http://").is_err());
        assert!(normalize("https://exa mple.com").is_err());
    }
}
