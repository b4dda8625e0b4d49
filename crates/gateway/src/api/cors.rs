//! CORS policy built from `server.cors.allowed_origins`.
//!
//! An entry ending in `:*` matches that scheme and host on any numeric
//! port; `["*"]` alone allows every origin without credentials.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use gacha_domain::config::CorsConfig;

const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

#[derive(Debug, Clone, PartialEq)]
enum OriginRule {
    Exact(String),
    AnyPort(String),
}

impl OriginRule {
    fn parse(entry: &str) -> Self {
        match entry.strip_suffix('*') {
            Some(prefix) if prefix.ends_with(':') => OriginRule::AnyPort(prefix.to_owned()),
            _ => OriginRule::Exact(entry.to_owned()),
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            OriginRule::Exact(o) => o == origin,
            OriginRule::AnyPort(prefix) => origin
                .strip_prefix(prefix.as_str())
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}

/// Build the CORS layer.  The challenge token header is always allowed so
/// browsers can send it cross-origin.
pub fn cors_layer(cors: &CorsConfig, token_header: &str) -> CorsLayer {
    let mut headers = vec![header::CONTENT_TYPE];
    match HeaderName::from_bytes(token_header.as_bytes()) {
        Ok(name) => headers.push(name),
        Err(_) => tracing::warn!(header = %token_header, "invalid token header name for CORS"),
    }
    let base = CorsLayer::new().allow_methods(METHODS).allow_headers(headers);

    if cors.allowed_origins == ["*"] {
        tracing::warn!("CORS configured with wildcard \"*\", all origins allowed");
        return base.allow_origin(Any);
    }

    let rules: Vec<OriginRule> = cors
        .allowed_origins
        .iter()
        .map(|o| OriginRule::parse(o))
        .collect();
    base.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin
            .to_str()
            .is_ok_and(|o| rules.iter().any(|r| r.matches(o)))
    }))
    .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(entries: &[&str], origin: &str) -> bool {
        entries
            .iter()
            .map(|e| OriginRule::parse(e))
            .any(|r| r.matches(origin))
    }

    #[test]
    fn port_wildcard_requires_numeric_port() {
        let entries = ["http://localhost:*"];
        assert!(allowed(&entries, "http://localhost:5173"));
        assert!(!allowed(&entries, "http://localhost:"));
        assert!(!allowed(&entries, "http://localhost:80.evil.com"));
        assert!(!allowed(&entries, "https://localhost:5173"));
    }

    #[test]
    fn exact_entries_match_exactly() {
        let entries = ["https://gacha.example.com"];
        assert!(allowed(&entries, "https://gacha.example.com"));
        assert!(!allowed(&entries, "https://gacha.example.com.evil"));
    }

    #[test]
    fn parse_distinguishes_rules() {
        assert_eq!(
            OriginRule::parse("http://127.0.0.1:*"),
            OriginRule::AnyPort("http://127.0.0.1:".into())
        );
        assert_eq!(
            OriginRule::parse("https://a.example"),
            OriginRule::Exact("https://a.example".into())
        );
    }
}
