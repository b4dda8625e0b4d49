//! Admission control + reward sampling for one pull request.
//!
//! `Validating → Verifying ∥ RateLimiting → Sampling`.  Verification and
//! quota consumption run concurrently and both run to completion; either
//! failing aborts the request before any draw is made.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use gacha_domain::reward::PullOutcome;
use gacha_domain::trace::TraceEvent;

use super::challenge::{ChallengeContext, ChallengeVerifier, VerificationError};
use super::limiter::{Limiter, QuotaKeys, RateLimitError, RateLimiterSet};
use super::random::RandomSource;
use super::sampler::{RewardSampler, TicketPool};

/// Number of trials in a multi-pull.
pub const MULTI_PULL: usize = 10;

/// One inbound pull, as extracted from the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct PullRequest {
    pub session_id: Option<String>,
    pub caller_ip: Option<String>,
    pub bot_cookie: Option<String>,
    pub challenge_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PullError {
    #[error("missing challenge token")]
    MissingToken,
    #[error("missing uid")]
    MissingUid,
    #[error("challenge verification failed")]
    VerificationRejected { codes: Vec<String> },
    #[error("verification service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("{limiter} quota exceeded")]
    QuotaExceeded {
        limiter: Limiter,
        retry_after: Duration,
    },
}

impl PullError {
    fn reason(&self) -> &'static str {
        match self {
            PullError::MissingToken => "missing_token",
            PullError::MissingUid => "missing_uid",
            PullError::VerificationRejected { .. } => "verification_rejected",
            PullError::UpstreamUnavailable(_) => "upstream_unavailable",
            PullError::QuotaExceeded { .. } => "quota_exceeded",
        }
    }
}

impl From<VerificationError> for PullError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::MissingToken => PullError::MissingToken,
            VerificationError::Rejected { codes } => PullError::VerificationRejected { codes },
            VerificationError::UpstreamUnavailable(msg) => PullError::UpstreamUnavailable(msg),
        }
    }
}

impl From<RateLimitError> for PullError {
    fn from(e: RateLimitError) -> Self {
        match e {
            RateLimitError::MissingUid => PullError::MissingUid,
            RateLimitError::QuotaExceeded {
                limiter,
                retry_after,
            } => PullError::QuotaExceeded {
                limiter,
                retry_after,
            },
        }
    }
}

/// Composes verification, rate limiting and sampling.
///
/// Built once at startup and shared by reference across handlers.
pub struct PullPipeline {
    verifier: Arc<dyn ChallengeVerifier>,
    limiters: Arc<RateLimiterSet>,
    sampler: RewardSampler,
    pool: TicketPool,
    rng: Arc<dyn RandomSource>,
}

impl PullPipeline {
    pub fn new(
        verifier: Arc<dyn ChallengeVerifier>,
        limiters: Arc<RateLimiterSet>,
        sampler: RewardSampler,
        pool: TicketPool,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            verifier,
            limiters,
            sampler,
            pool,
            rng,
        }
    }

    pub fn limiters(&self) -> &RateLimiterSet {
        &self.limiters
    }

    pub fn sampler(&self) -> &RewardSampler {
        &self.sampler
    }

    pub fn pool(&self) -> &TicketPool {
        &self.pool
    }

    /// Single draw.
    pub async fn pull_one(&self, req: &PullRequest) -> Result<PullOutcome, PullError> {
        let span = pull_span(req, 1);
        async {
            self.admit(req).await?;
            let outcome = self.draw_once();
            served(req, std::slice::from_ref(&outcome));
            Ok::<_, PullError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Ten independent draws, in trial order.
    pub async fn pull_ten(&self, req: &PullRequest) -> Result<[PullOutcome; MULTI_PULL], PullError> {
        let span = pull_span(req, MULTI_PULL);
        async {
            self.admit(req).await?;
            let outcomes: [PullOutcome; MULTI_PULL] = std::array::from_fn(|_| self.draw_once());
            served(req, &outcomes);
            Ok::<_, PullError>(outcomes)
        }
        .instrument(span)
        .await
    }

    // ── Private ──────────────────────────────────────────────────────

    async fn admit(&self, req: &PullRequest) -> Result<(), PullError> {
        let result = self.check(req).await;
        if let Err(e) = &result {
            tracing::info!(reason = e.reason(), error = %e, "pull rejected");
            TraceEvent::PullRejected {
                session_id: req.session_id.clone(),
                reason: e.reason().to_owned(),
            }
            .emit();
        }
        result
    }

    async fn check(&self, req: &PullRequest) -> Result<(), PullError> {
        let token = non_empty(&req.challenge_token).ok_or(PullError::MissingToken)?;
        let uid = non_empty(&req.session_id).ok_or(PullError::MissingUid)?;
        let ip = non_empty(&req.caller_ip);

        let ctx = ChallengeContext { ip };
        let verify = self.verifier.verify(token, &ctx).instrument(tracing::info_span!(
            "challenge.verify",
            ip = tracing::field::Empty
        ));

        let keys = QuotaKeys {
            ip,
            uid: Some(uid),
            bot_cookie: non_empty(&req.bot_cookie),
        };
        let limit = async {
            tracing::info_span!("rate_limit").in_scope(|| self.limiters.consume_all(&keys))
        };

        let (verified, limited) = tokio::join!(verify, limit);
        verified?;
        limited?;
        Ok(())
    }

    fn draw_once(&self) -> PullOutcome {
        let Some(tier) = self.sampler.sample(self.rng.as_ref()) else {
            return PullOutcome::None;
        };

        let _span = tracing::info_span!("reward.tier", tier = %tier.name).entered();
        if self.sampler.is_top(tier) {
            match self.pool.draw(self.rng.as_ref()) {
                Some(ticket) => {
                    tracing::info!(ticket = %ticket, "ticket drawn");
                    PullOutcome::Ticket(ticket)
                }
                None => PullOutcome::None,
            }
        } else {
            PullOutcome::Tier(tier.name.clone())
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn pull_span(req: &PullRequest, draws: usize) -> tracing::Span {
    tracing::info_span!(
        "pull",
        session = req.session_id.as_deref().unwrap_or(""),
        draws,
        request_id = %Uuid::new_v4()
    )
}

fn served(req: &PullRequest, outcomes: &[PullOutcome]) {
    TraceEvent::PullServed {
        session_id: req.session_id.clone().unwrap_or_default(),
        draws: outcomes.len(),
        tickets: outcomes.iter().filter(|o| o.is_ticket()).count(),
        tiers: outcomes
            .iter()
            .filter(|o| matches!(o, PullOutcome::Tier(_)))
            .count(),
    }
    .emit();
}
