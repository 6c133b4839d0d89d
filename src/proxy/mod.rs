// Proxy module - HTTP relay in front of an OpenAI-compatible upstream
//
// Every request under `/v1/` is forwarded to the configured upstream with the
// caller's credentials swapped for the relay's own. Responses stream straight
// back while the SSE sniffer watches for usage accounting.
//
// Request flow:
//   headers::sanitize_request_headers -> identity::resolve_identity
//     -> inject::inject_user -> relay::relay -> handlers::streaming (sse sniffer)

pub mod handlers;
pub mod headers;
pub mod identity;
pub mod inject;
pub mod relay;
pub mod sse;

mod error;
mod server;
mod state;

pub use error::ProxyError;
pub use server::start_proxy;
