//! Challenge-response verification against Cloudflare Turnstile's
//! `siteverify` endpoint.
//!
//! One attempt per request, bounded by the client timeout.  Timeouts and
//! transport errors surface as [`VerificationError::UpstreamUnavailable`];
//! the caller decides what to do with them (the pull pipeline aborts).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use gacha_domain::config::ChallengeConfig;
use gacha_domain::trace::TraceEvent;

/// Request-side context forwarded to the verification service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeContext<'a> {
    pub ip: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("missing challenge token")]
    MissingToken,
    #[error("challenge rejected ({})", .codes.join(", "))]
    Rejected { codes: Vec<String> },
    #[error("verification service unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Proves a caller passed an anti-automation challenge.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(
        &self,
        token: &str,
        ctx: &ChallengeContext<'_>,
    ) -> Result<(), VerificationError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turnstile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct SiteverifyForm<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifier backed by the Turnstile HTTP API.
///
/// Created once at startup; the underlying `reqwest::Client` keeps a
/// connection pool.  Not `Debug`: it holds the secret.
pub struct TurnstileVerifier {
    http: Client,
    verify_url: String,
    secret: String,
}

impl TurnstileVerifier {
    pub fn new(cfg: &ChallengeConfig, secret: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            verify_url: cfg.verify_url.clone(),
            secret,
        })
    }
}

#[async_trait]
impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(
        &self,
        token: &str,
        ctx: &ChallengeContext<'_>,
    ) -> Result<(), VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::MissingToken);
        }
        if let Some(ip) = ctx.ip {
            tracing::Span::current().record("ip", ip);
        }

        let form = SiteverifyForm {
            secret: &self.secret,
            response: token,
            remoteip: ctx.ip,
        };

        let start = Instant::now();
        let result = self.http.post(&self.verify_url).form(&form).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = result.map_err(|e| {
            let reason = if e.is_timeout() {
                "timed out".to_owned()
            } else {
                e.to_string()
            };
            tracing::warn!(duration_ms, reason = %reason, "siteverify call failed");
            VerificationError::UpstreamUnavailable(reason)
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "siteverify returned an error status");
            return Err(VerificationError::UpstreamUnavailable(format!(
                "siteverify returned {status}"
            )));
        }

        let body: SiteverifyResponse = resp.json().await.map_err(|e| {
            VerificationError::UpstreamUnavailable(format!("malformed siteverify response: {e}"))
        })?;

        TraceEvent::ChallengeChecked {
            success: body.success,
            duration_ms,
            error_codes: body.error_codes.clone(),
        }
        .emit();

        if body.success {
            Ok(())
        } else {
            Err(VerificationError::Rejected {
                codes: body.error_codes,
            })
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dev mode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accepts any non-empty token.  Used when no secret is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveVerifier;

#[async_trait]
impl ChallengeVerifier for PermissiveVerifier {
    async fn verify(
        &self,
        token: &str,
        ctx: &ChallengeContext<'_>,
    ) -> Result<(), VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::MissingToken);
        }
        if let Some(ip) = ctx.ip {
            tracing::Span::current().record("ip", ip);
        }
        Ok(())
    }
}
