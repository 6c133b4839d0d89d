//! Upstream HTTP leg of the relay

use anyhow::{Context, Result};
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;

use super::error::ProxyError;

/// A fully prepared upstream request
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// `{api_url}/v1/{path}` without query
    pub url: String,
    /// Raw query string, appended verbatim
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    pub fn full_url(&self) -> String {
        match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => format!("{}?{}", self.url, query),
            None => self.url.clone(),
        }
    }
}

/// Upstream status and headers; the body has not been read yet
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
}

/// Build the shared upstream client
///
/// No overall timeout: completions can stream for as long as the model takes.
/// Redirects are returned to the caller rather than followed, so the relay
/// credential is never replayed to another host.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to create HTTP client")
}

/// Send the request and return as soon as response headers arrive
pub async fn relay(
    client: &reqwest::Client,
    request: UpstreamRequest,
) -> Result<UpstreamResponse, ProxyError> {
    let url = request.full_url();
    tracing::debug!("Forwarding {} {}", request.method, url);

    let mut builder = client
        .request(request.method, &url)
        .headers(request.headers);
    if !request.body.is_empty() {
        builder = builder.body(request.body);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    Ok(UpstreamResponse {
        status: response.status(),
        headers: response.headers().clone(),
        body: response.bytes_stream().boxed(),
    })
}
