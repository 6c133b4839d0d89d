//! Proxy state shared by every request

use std::sync::Arc;

use crate::config::UpstreamConfig;
use crate::storage::EventSink;

/// Shared state for the proxy server
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct ProxyState {
    /// HTTP client for forwarding requests (pooled)
    pub(super) client: reqwest::Client,
    /// Upstream URL, credential and attribution headers
    pub(super) upstream: Arc<UpstreamConfig>,
    /// Fire-and-forget telemetry
    pub(super) events: EventSink,
}

impl ProxyState {
    pub fn new(client: reqwest::Client, upstream: UpstreamConfig, events: EventSink) -> Self {
        Self {
            client,
            upstream: Arc::new(upstream),
            events,
        }
    }
}
