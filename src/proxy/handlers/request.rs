//! Main proxy request handler

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, Request, Response},
};

use crate::events::ProxyEvent;
use crate::proxy::headers::sanitize_request_headers;
use crate::proxy::identity::resolve_identity;
use crate::proxy::inject::inject_user;
use crate::proxy::relay::{relay, UpstreamRequest};
use crate::proxy::sse::SniffContext;
use crate::proxy::state::ProxyState;
use crate::proxy::ProxyError;

use super::path_suffix;
use super::streaming::stream_response;

/// Forward one `/v1/*` request upstream and stream the answer back
pub async fn proxy_handler(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(String::from);

    // Fails before touching the body when no credential is configured
    let headers = sanitize_request_headers(&parts.headers, &state.upstream)?;
    let identity = resolve_identity(&parts.headers);
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    tracing::debug!(
        method = %method,
        path = %path,
        identity_source = identity.source(),
        "Proxying request"
    );

    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    let (body, injected) = inject_user(body, &identity, &method, content_type).into_parts();
    let user_id = identity.as_str().map(String::from);

    state.events.emit(ProxyEvent::request(
        method.as_str(),
        &path,
        query.as_deref().unwrap_or(""),
        user_id.as_deref(),
        injected,
    ));

    let upstream_request = UpstreamRequest {
        method: method.clone(),
        url: state.upstream.endpoint(path_suffix(&path)),
        query,
        headers,
        body,
    };

    let start = Instant::now();
    let upstream = relay(&state.client, upstream_request).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        method = %method,
        path = %path,
        status = upstream.status.as_u16(),
        user_id = user_id.as_deref().unwrap_or("-"),
        elapsed_ms,
        "Upstream responded"
    );

    state.events.emit(ProxyEvent::ResponseStream {
        status_code: upstream.status.as_u16(),
        elapsed_ms,
        path: path.clone(),
    });

    let context = SniffContext {
        user_id,
        path,
        sink: state.events.clone(),
    };

    stream_response(upstream, context)
}
