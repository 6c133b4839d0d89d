// Telemetry events emitted by the relay
//
// One event per line on the sink. Events carry metadata only: method, path,
// status, timing, caller identity and the upstream's usage object. Request and
// response bodies are never recorded.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Telemetry event written to the event sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")] // {"type": "usage_report", ...}
pub enum ProxyEvent {
    /// An inbound request is about to be forwarded upstream
    Request {
        /// Unix seconds
        ts: i64,
        method: String,
        path: String,
        query: String,
        user_id: Option<String>,
        injected_tracking: bool,
    },

    /// Upstream answered with headers; the body is now streaming
    ResponseStream {
        status_code: u16,
        /// Time from the start of the request to upstream headers
        elapsed_ms: u64,
        path: String,
    },

    /// A streamed frame carried usage accounting
    UsageReport {
        user_id: Option<String>,
        /// Empty when the upstream omitted it
        model: String,
        /// Passed through verbatim
        usage: serde_json::Value,
    },
}

impl ProxyEvent {
    pub fn request(
        method: &str,
        path: &str,
        query: &str,
        user_id: Option<&str>,
        injected_tracking: bool,
    ) -> Self {
        ProxyEvent::Request {
            ts: Utc::now().timestamp(),
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            user_id: user_id.map(String::from),
            injected_tracking,
        }
    }

    /// Short name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyEvent::Request { .. } => "request",
            ProxyEvent::ResponseStream { .. } => "response_stream",
            ProxyEvent::UsageReport { .. } => "usage_report",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_report_wire_format() {
        let event = ProxyEvent::UsageReport {
            user_id: Some("alice@example.com".to_string()),
            model: "openai/gpt-4o".to_string(),
            usage: json!({"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "usage_report",
                "user_id": "alice@example.com",
                "model": "openai/gpt-4o",
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })
        );
    }

    #[test]
    fn test_request_event_discriminant_and_null_user() {
        let event = ProxyEvent::request("POST", "/v1/chat/completions", "", None, false);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "request");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["path"], "/v1/chat/completions");
        assert!(value["user_id"].is_null());
        assert_eq!(value["injected_tracking"], false);
        assert!(value["ts"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_response_stream_discriminant() {
        let event = ProxyEvent::ResponseStream {
            status_code: 200,
            elapsed_ms: 42,
            path: "/v1/models".to_string(),
        };
        assert_eq!(event.kind(), "response_stream");
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.starts_with(r#"{"type":"response_stream""#));
        assert!(!line.contains('\n'));
    }
}
