//! Proxy error types and response handling

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

/// Errors that can occur during proxying
#[derive(Debug)]
pub enum ProxyError {
    /// No upstream API key configured
    MissingCredential,
    /// A configured value cannot be sent as a header
    InvalidHeader(String),
    BodyRead(String),
    Upstream(String),
    ResponseBuild(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidHeader(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::ResponseBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::MissingCredential => write!(f, "OPENROUTER_API_KEY not set"),
            ProxyError::InvalidHeader(name) => write!(f, "Invalid {} header value", name),
            ProxyError::BodyRead(msg) => write!(f, "Failed to read request body: {}", msg),
            ProxyError::Upstream(msg) => write!(f, "Upstream request failed: {}", msg),
            ProxyError::ResponseBuild(msg) => write!(f, "Failed to build response: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();
        let message = self.to_string();

        tracing::error!("Proxy error: {} - {}", status, message);

        Response::builder()
            .status(status)
            .body(Body::from(message))
            .unwrap_or_else(|_| Response::new(Body::from("Internal error building error response")))
    }
}
