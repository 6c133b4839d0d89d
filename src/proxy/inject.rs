//! Inject the caller identity into outbound JSON requests
//!
//! OpenAI-compatible APIs accept a top-level `user` field for per-end-user
//! attribution. When the relay knows who is calling, it sets that field on
//! JSON object bodies of POST requests. Anything else goes upstream untouched.

use axum::http::Method;
use bytes::Bytes;
use serde_json::Value;

use super::identity::CallerIdentity;

/// Outcome of an injection attempt; both variants carry the body to forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// Body was re-serialized with `user` set
    Injected(Bytes),
    /// Body is the original bytes, unmodified
    Unchanged(Bytes),
}

impl Injection {
    #[cfg(test)]
    pub fn injected(&self) -> bool {
        matches!(self, Injection::Injected(_))
    }

    #[cfg(test)]
    pub fn body(&self) -> &Bytes {
        match self {
            Injection::Injected(body) | Injection::Unchanged(body) => body,
        }
    }

    /// `(body, injected)`
    pub fn into_parts(self) -> (Bytes, bool) {
        match self {
            Injection::Injected(body) => (body, true),
            Injection::Unchanged(body) => (body, false),
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Set `user` on a JSON object body when method, content type and identity allow it
pub fn inject_user(
    body: Bytes,
    identity: &CallerIdentity,
    method: &Method,
    content_type: Option<&str>,
) -> Injection {
    let Some(user) = identity.as_str() else {
        return Injection::Unchanged(body);
    };
    if method != Method::POST || !is_json(content_type) || body.is_empty() {
        return Injection::Unchanged(body);
    }

    let mut payload = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!("Body is not valid JSON, forwarding unchanged: {}", e);
            return Injection::Unchanged(body);
        }
    };

    let Some(object) = payload.as_object_mut() else {
        return Injection::Unchanged(body);
    };
    object.insert("user".to_string(), Value::String(user.to_string()));

    match serde_json::to_vec(&payload) {
        Ok(rewritten) => Injection::Injected(Bytes::from(rewritten)),
        Err(_) => Injection::Unchanged(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json");

    fn known(id: &str) -> CallerIdentity {
        CallerIdentity::Forwarded(id.to_string())
    }

    fn parsed(body: &Bytes) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn test_injects_user_into_object_body() {
        let body = Bytes::from_static(br#"{"model":"x"}"#);
        let result = inject_user(body, &known("u1"), &Method::POST, JSON);

        assert!(result.injected());
        assert_eq!(parsed(result.body()), json!({"model": "x", "user": "u1"}));
    }

    #[test]
    fn test_overwrites_existing_user_field() {
        let body = Bytes::from_static(br#"{"model":"x","user":"spoofed"}"#);
        let (body, injected) = inject_user(
            body,
            &CallerIdentity::UnverifiedClaim("real@example.com".to_string()),
            &Method::POST,
            Some("Application/JSON; charset=utf-8"),
        )
        .into_parts();

        assert!(injected);
        assert_eq!(parsed(&body)["user"], "real@example.com");
    }

    #[test]
    fn test_malformed_json_is_byte_identical() {
        let body = Bytes::from_static(br#"{"model": "x", "#);
        let result = inject_user(body.clone(), &known("u1"), &Method::POST, JSON);
        assert_eq!(result, Injection::Unchanged(body));
    }

    #[test]
    fn test_non_object_json_is_unchanged() {
        let raws: [&[u8]; 4] = [b"[1,2,3]", b"\"text\"", b"42", b"null"];
        for raw in raws {
            let body = Bytes::copy_from_slice(raw);
            let result = inject_user(body.clone(), &known("u1"), &Method::POST, JSON);
            assert_eq!(result, Injection::Unchanged(body));
        }
    }

    #[test]
    fn test_preconditions_block_injection() {
        let body = Bytes::from_static(br#"{"model":"x"}"#);

        let cases = [
            (CallerIdentity::Unknown, Method::POST, JSON),
            (known("u1"), Method::PUT, JSON),
            (known("u1"), Method::GET, JSON),
            (known("u1"), Method::POST, Some("text/plain")),
            (known("u1"), Method::POST, None),
        ];

        for (identity, method, content_type) in cases {
            let result = inject_user(body.clone(), &identity, &method, content_type);
            assert_eq!(result, Injection::Unchanged(body.clone()), "{} {:?}", method, content_type);
        }

        let empty = inject_user(Bytes::new(), &known("u1"), &Method::POST, JSON);
        assert_eq!(empty, Injection::Unchanged(Bytes::new()));
    }
}
