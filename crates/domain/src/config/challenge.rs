use serde::{Deserialize, Serialize};

/// Challenge-verification (Turnstile) settings.
///
/// The shared secret is never stored in the config file; `secret_env`
/// names the environment variable it is read from at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "d_secret_env")]
    pub secret_env: String,
    #[serde(default = "d_verify_url")]
    pub verify_url: String,
    /// Hard timeout for one verification call.
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    /// Request header carrying the client's challenge token.
    #[serde(default = "d_token_header")]
    pub token_header: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            secret_env: d_secret_env(),
            verify_url: d_verify_url(),
            timeout_ms: d_timeout_ms(),
            token_header: d_token_header(),
        }
    }
}

impl ChallengeConfig {
    /// Read the secret from the configured env var; `None` when unset or empty.
    pub fn secret(&self) -> Option<String> {
        std::env::var(&self.secret_env)
            .ok()
            .filter(|s| !s.trim().is_empty())
    }
}

fn d_secret_env() -> String {
    "TURNSTILE_SECRET".into()
}
fn d_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".into()
}
fn d_timeout_ms() -> u64 {
    5_000
}
fn d_token_header() -> String {
    "x-turnstile-token".into()
}
