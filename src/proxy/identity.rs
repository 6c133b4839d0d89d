//! Caller identity for usage attribution
//!
//! The identity is advisory. It labels telemetry and the upstream `user`
//! field; nothing in the relay grants or denies access based on it. Token
//! claims are read without verifying the signature, which is why that variant
//! is named `UnverifiedClaim`.

use axum::http::header::{HeaderMap, AUTHORIZATION};
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;

/// Set by Open WebUI when `ENABLE_FORWARD_USER_INFO_HEADERS=true`
pub const USER_EMAIL_HEADER: &str = "x-openwebui-user-email";
pub const USER_ID_HEADER: &str = "x-openwebui-user-id";

/// Claims checked in priority order
const IDENTITY_CLAIMS: &[&str] = &["email", "id", "sub"];

/// URL-safe, padded input; tolerant of non-zero trailing bits like most JWT issuers' decoders
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Who the relay believes is calling, for telemetry only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// From a forwarded-identity header set by the trusted front-end
    Forwarded(String),
    /// From a bearer token's claims, signature not checked
    UnverifiedClaim(String),
    /// Could not be determined
    Unknown,
}

impl CallerIdentity {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CallerIdentity::Forwarded(id) | CallerIdentity::UnverifiedClaim(id) => Some(id),
            CallerIdentity::Unknown => None,
        }
    }

    #[cfg(test)]
    pub fn is_known(&self) -> bool {
        !matches!(self, CallerIdentity::Unknown)
    }

    /// Where the identity came from, for debug logging
    pub fn source(&self) -> &'static str {
        match self {
            CallerIdentity::Forwarded(_) => "header",
            CallerIdentity::UnverifiedClaim(_) => "token",
            CallerIdentity::Unknown => "none",
        }
    }
}

/// Resolve the caller identity from request headers.
///
/// Trusted headers win over token claims. Every failure yields `Unknown`.
pub fn resolve_identity(headers: &HeaderMap) -> CallerIdentity {
    if let Some(id) = forwarded_identity(headers) {
        return CallerIdentity::Forwarded(id);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .and_then(claims_identity)
        .map(CallerIdentity::UnverifiedClaim)
        .unwrap_or(CallerIdentity::Unknown)
}

fn forwarded_identity(headers: &HeaderMap) -> Option<String> {
    [USER_EMAIL_HEADER, USER_ID_HEADER].iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Read `email`, `id` or `sub` from the second dot-separated segment of a token
pub(crate) fn claims_identity(token: &str) -> Option<String> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let decoded = CLAIMS_ENGINE.decode(padded.as_bytes()).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let claims = claims.as_object()?;

    IDENTITY_CLAIMS
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(claim_as_identity))
}

fn claim_as_identity(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn token_with_claims(claims: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims.as_bytes())
        )
    }

    fn with_bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_email_header_wins_over_id_header_and_token() {
        let mut headers = with_bearer(&token_with_claims(r#"{"email":"jwt@example.com"}"#));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("alice@example.com"));

        assert_eq!(
            resolve_identity(&headers),
            CallerIdentity::Forwarded("alice@example.com".to_string())
        );
    }

    #[test]
    fn test_id_header_used_when_email_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static(""));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));

        assert_eq!(
            resolve_identity(&headers),
            CallerIdentity::Forwarded("u1".to_string())
        );
    }

    #[test]
    fn test_token_claim_priority() {
        let headers = with_bearer(&token_with_claims(
            r#"{"sub":"s-1","id":"id-1","email":"bob@example.com"}"#,
        ));
        assert_eq!(
            resolve_identity(&headers),
            CallerIdentity::UnverifiedClaim("bob@example.com".to_string())
        );

        let headers = with_bearer(&token_with_claims(r#"{"sub":"s-1","id":"id-1"}"#));
        assert_eq!(resolve_identity(&headers).as_str(), Some("id-1"));

        let headers = with_bearer(&token_with_claims(r#"{"sub":"s-1","email":""}"#));
        assert_eq!(resolve_identity(&headers).as_str(), Some("s-1"));
    }

    #[test]
    fn test_numeric_id_claim_is_stringified() {
        let headers = with_bearer(&token_with_claims(r#"{"id":42}"#));
        assert_eq!(resolve_identity(&headers).as_str(), Some("42"));
    }

    #[test]
    fn test_padding_is_added_to_payload_segment() {
        // Encoded payloads needing one, zero and two padding characters
        for claims in [r#"{"sub":"a"}"#, r#"{"sub":"ab"}"#, r#"{"sub":"abc"}"#] {
            let token = token_with_claims(claims);
            assert!(claims_identity(&token).is_some(), "failed for {}", claims);
        }
    }

    #[test]
    fn test_malformed_tokens_yield_unknown() {
        let cases = [
            "no-dots-at-all".to_string(),
            "header.!!!not-base64!!!.sig".to_string(),
            format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"not json")),
            format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"[1,2,3]")),
            token_with_claims(r#"{"name":"no identity claims"}"#),
            token_with_claims(r#"{"email":null,"id":false}"#),
            "h.a.s".to_string(),
        ];

        for token in &cases {
            assert_eq!(
                resolve_identity(&with_bearer(token)),
                CallerIdentity::Unknown,
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_non_bearer_schemes_are_ignored() {
        let token = token_with_claims(r#"{"sub":"s-1"}"#);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
        );
        assert_eq!(resolve_identity(&headers), CallerIdentity::Unknown);

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("bearer {}", token)).unwrap(),
        );
        assert_eq!(resolve_identity(&headers).as_str(), Some("s-1"));
    }

    #[test]
    fn test_no_headers_is_unknown() {
        let identity = resolve_identity(&HeaderMap::new());
        assert!(!identity.is_known());
        assert_eq!(identity.source(), "none");
    }
}
