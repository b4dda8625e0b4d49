use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3000")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Header carrying the real client address, set by a trusted proxy or
    /// CDN (e.g. `cf-connecting-ip`).  Unset by default: the TCP peer
    /// address keys the per-IP quota.  Only configure this when every
    /// request reaches the gateway through that proxy, since clients can
    /// send the header themselves.  Requests without it fall back to the
    /// peer address.
    #[serde(default)]
    pub client_ip_header: Option<String>,
    /// Upper bound on in-flight requests (backpressure).
    #[serde(default = "d_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Directory of static assets served for any path the API does not
    /// claim.  Ignored when the directory does not exist.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".into(),
            cors: CorsConfig::default(),
            client_ip_header: None,
            max_concurrent_requests: d_max_concurrent(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Use `["*"]` for permissive (NOT recommended).
    /// Defaults to localhost-only.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3000() -> u16 {
    3000
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_max_concurrent() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_all_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.client_ip_header, None);
        assert_eq!(cfg.max_concurrent_requests, 256);
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn parses_overrides() {
        let toml_str = r#"
            port = 8080
            host = "0.0.0.0"
            client_ip_header = "x-forwarded-for"
            static_dir = "public"
        "#;
        let cfg: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.client_ip_header.as_deref(), Some("x-forwarded-for"));
        assert_eq!(cfg.static_dir, Some(PathBuf::from("public")));
    }
}
