//! Upstream API configuration
//!
//! Everything the request pipeline needs to talk to the upstream: where it is,
//! which credential to present, and the optional attribution headers.

use serde::Deserialize;

use super::VERSION;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api";

/// Upstream connection settings, immutable after startup
#[derive(Clone, Default)]
pub struct UpstreamConfig {
    /// Base URL; requests go to `{api_url}/v1/{path}`
    pub api_url: String,
    /// Bearer credential presented upstream. `None` fails every request.
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` when set
    pub http_referer: Option<String>,
    /// Sent as `X-Title` when set
    pub x_title: Option<String>,
}

// Hand-written so the credential never reaches a log line.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("http_referer", &self.http_referer)
            .field("x_title", &self.x_title)
            .finish()
    }
}

/// `[upstream]` section as loaded from config file
///
/// The credential is deliberately not accepted here: it comes from
/// `OPENROUTER_API_KEY` only.
#[derive(Debug, Deserialize, Default)]
pub struct FileUpstream {
    pub api_url: Option<String>,
    pub http_referer: Option<String>,
    pub x_title: Option<String>,
}

impl UpstreamConfig {
    pub fn from_file(file: Option<FileUpstream>, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let file = file.unwrap_or_default();

        let api_url = env("OPENROUTER_BASE")
            .or(file.api_url)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: non_empty(env("OPENROUTER_API_KEY")),
            http_referer: non_empty(env("OPENROUTER_HTTP_REFERER").or(file.http_referer)),
            x_title: non_empty(env("OPENROUTER_X_TITLE").or(file.x_title)),
        }
    }

    /// Full upstream URL for a path suffix under `/v1/`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_url, path.trim_start_matches('/'))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `User-Agent` sent upstream when the caller did not provide one
pub fn default_user_agent() -> String {
    format!("usage-relay/{}", VERSION)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
