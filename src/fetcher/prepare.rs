//! Turning a job target into an outbound request

use super::Fetcher;
use crate::config::FetchConfig;
use crate::error::Error;
use crate::normalize::with_default_scheme;
use crate::types::{Diagnostics, FetchRequest, FetchTarget, RequestSpec};
use url::Url;

impl Fetcher {
    /// Build the request for `target`
    ///
    /// Raw URLs go through the normalizer and become GET requests. Prebuilt
    /// requests are kept as they are, except that a missing scheme becomes
    /// `https`. Afterwards an empty path becomes `/` and a valid forced
    /// protocol overrides the scheme.
    pub(super) fn prepare_request(
        &self,
        target: FetchTarget,
        config: &FetchConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<FetchRequest, Error> {
        let mut request = match target {
            FetchTarget::Url(raw) => {
                diagnostics.verbose(|| format!("orig str url: {raw}"));
                match self.normalizer.normalize(&raw) {
                    Ok(url) => FetchRequest::get(url),
                    Err(reason) => {
                        diagnostics.record(format!("could not parse url {raw:?}: {reason}"));
                        return Err(Error::Parse { input: raw, reason });
                    }
                }
            }
            FetchTarget::Request(spec) => {
                diagnostics.verbose(|| format!("orig req url: {}", spec.url));
                resolve_spec(spec, diagnostics)?
            }
        };

        if request.url.path().is_empty() {
            request.url.set_path("/");
        }

        if let Some(protocol) = config.forced_protocol()
            && request.set_scheme(protocol.as_str())
        {
            diagnostics.record(format!("Forcing protocol {:?}", protocol.as_str()));
        }

        Ok(request)
    }
}

fn resolve_spec(spec: RequestSpec, diagnostics: &mut Diagnostics) -> Result<FetchRequest, Error> {
    let RequestSpec {
        method,
        url,
        headers,
        body,
    } = spec;

    let parsed = match Url::parse(&with_default_scheme(url.trim())) {
        Ok(parsed) => parsed,
        Err(e) => {
            diagnostics.record(format!("could not parse request url {url:?}: {e}"));
            return Err(Error::Parse {
                input: url,
                reason: e.to_string(),
            });
        }
    };

    Ok(FetchRequest {
        method,
        url: parsed,
        headers,
        body,
    })
}
