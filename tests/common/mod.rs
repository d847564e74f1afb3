//! Common test utilities for resilient-fetch integration tests

use resilient_fetch::Fetcher;
use resilient_fetch::transport::ReqwestClientFactory;
use std::sync::Arc;
use wiremock::MockServer;

/// Fetcher over the real reqwest transport, bypassing system proxies so
/// requests reach the local mock server
pub fn local_fetcher() -> Fetcher {
    Fetcher::new().with_client_factory(Arc::new(
        ReqwestClientFactory::new()
            .no_proxy()
            .user_agent("resilient-fetch-tests"),
    ))
}

/// Absolute URL for `path` on the mock server
pub fn url(server: &MockServer, path: &str) -> String {
    format!("{}{}", server.uri(), path)
}

/// Number of requests the mock server has seen
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
