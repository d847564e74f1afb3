//! Draining the response

use crate::error::Error;
use crate::transport::TransportResponse;
use crate::types::Fetched;
use crate::utils::parse_last_modified;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::LAST_MODIFIED;

/// Read the whole body into memory and parse `Last-Modified`
///
/// The body stream is owned here and dropped on every path.
pub(super) async fn read_response(
    response: TransportResponse,
) -> Result<(Fetched, Option<DateTime<Utc>>), Error> {
    let TransportResponse {
        status,
        headers,
        body,
    } = response;

    let Some(mut body) = body else {
        return Err(Error::EmptyResponse { status });
    };

    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk.map_err(Error::BodyRead)?);
    }
    drop(body);

    let modified = headers
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_last_modified);

    Ok((Fetched::new(status, headers, bytes), modified))
}
