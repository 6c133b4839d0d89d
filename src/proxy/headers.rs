//! Header rewriting for both directions of the relay
//!
//! Outbound (caller → upstream): drop the caller's credentials, cookies,
//! forwarding metadata and hop-by-hop headers, then present the relay's own
//! credential. Inbound (upstream → caller): drop hop-by-hop headers and the
//! framing headers that no longer describe the re-streamed body.

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONNECTION, USER_AGENT,
};

use crate::config::{default_user_agent, UpstreamConfig};

use super::error::ProxyError;

/// Headers meaningful only for a single transport leg (RFC 9110 §7.6.1)
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Caller headers that must never reach the upstream
///
/// `accept-encoding` is dropped so the upstream answers uncompressed; the relay
/// sniffs the body as text and does not decode br/zstd.
pub const SENSITIVE_REQUEST_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "cookie",
    "authorization",
    "x-forwarded-for",
    "x-real-ip",
    "x-forwarded-proto",
    "x-forwarded-host",
    "accept-encoding",
];

/// Upstream framing headers invalidated by re-streaming
const STALE_RESPONSE_HEADERS: &[&str] = &["content-length", "content-encoding"];

const HTTP_REFERER: HeaderName = HeaderName::from_static("http-referer");
const X_TITLE: HeaderName = HeaderName::from_static("x-title");

pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

fn is_sensitive(name: &HeaderName) -> bool {
    SENSITIVE_REQUEST_HEADERS.contains(&name.as_str())
}

/// Extra hop-by-hop names a sender listed in its `Connection` header
fn connection_tokens(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Build the header set sent upstream.
///
/// Fails only when no upstream credential is configured (or it cannot be
/// encoded as a header value). Applying this to its own output yields the
/// same output.
pub fn sanitize_request_headers(
    inbound: &HeaderMap,
    upstream: &UpstreamConfig,
) -> Result<HeaderMap, ProxyError> {
    let api_key = upstream
        .api_key
        .as_deref()
        .ok_or(ProxyError::MissingCredential)?;

    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|_| ProxyError::InvalidHeader("authorization".to_string()))?;
    authorization.set_sensitive(true);

    let user_agent = match inbound.get(USER_AGENT) {
        Some(value) => value.clone(),
        None => HeaderValue::from_str(&default_user_agent())
            .map_err(|_| ProxyError::InvalidHeader("user-agent".to_string()))?,
    };

    let listed = connection_tokens(inbound);
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len() + 4);

    for (name, value) in inbound.iter() {
        if is_sensitive(name) || is_hop_by_hop(name) || listed.iter().any(|t| t == name.as_str())
        {
            continue;
        }
        // Re-set below with a single value
        if name == USER_AGENT || name == ACCEPT {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    outbound.insert(AUTHORIZATION, authorization);
    outbound.insert(USER_AGENT, user_agent);

    if let Some(referer) = &upstream.http_referer {
        let value = HeaderValue::from_str(referer)
            .map_err(|_| ProxyError::InvalidHeader("http-referer".to_string()))?;
        outbound.insert(HTTP_REFERER, value);
    }
    if let Some(title) = &upstream.x_title {
        let value = HeaderValue::from_str(title)
            .map_err(|_| ProxyError::InvalidHeader("x-title".to_string()))?;
        outbound.insert(X_TITLE, value);
    }

    outbound.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Ok(outbound)
}

/// Build the header set returned to the caller from the upstream's headers
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let listed = connection_tokens(upstream);
    let mut headers = HeaderMap::with_capacity(upstream.keys_len());

    for (name, value) in upstream.iter() {
        if is_hop_by_hop(name)
            || STALE_RESPONSE_HEADERS.contains(&name.as_str())
            || listed.iter().any(|t| t == name.as_str())
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers
}
