//! Request and response handlers for the proxy
//!
//! `proxy_handler` runs the request pipeline for every `/v1/*` call;
//! `streaming` turns the upstream response into the caller's response without
//! buffering it.

mod request;
mod streaming;

pub use request::proxy_handler;

/// Every route the relay serves lives under this prefix
pub(super) const ROUTE_PREFIX: &str = "/v1/";

/// Path suffix after `/v1/`, still percent-encoded as the caller sent it
pub(super) fn path_suffix(path: &str) -> &str {
    path.strip_prefix(ROUTE_PREFIX).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_suffix_is_not_decoded() {
        assert_eq!(path_suffix("/v1/chat/completions"), "chat/completions");
        assert_eq!(path_suffix("/v1/models/a%2Fb"), "models/a%2Fb");
        assert_eq!(path_suffix("/v2/models"), "");
    }
}
