//! Streaming response handling

use axum::{body::Body, http::Response};

use crate::proxy::headers::sanitize_response_headers;
use crate::proxy::relay::UpstreamResponse;
use crate::proxy::sse::{SniffContext, UsageSniffer};
use crate::proxy::ProxyError;

/// Build the caller's response around the upstream body
///
/// Status is passed through, headers are sanitized, and the body is relayed
/// chunk by chunk through the usage sniffer. When the caller goes away axum
/// drops the body, which drops the sniffer and with it the upstream connection.
pub(super) fn stream_response(
    upstream: UpstreamResponse,
    context: SniffContext,
) -> Result<Response<Body>, ProxyError> {
    let mut builder = Response::builder().status(upstream.status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(sanitize_response_headers(&upstream.headers));
    }

    let sniffer = UsageSniffer::new(upstream.body, context);

    builder
        .body(Body::from_stream(sniffer))
        .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
}
