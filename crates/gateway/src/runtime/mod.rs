//! Admission control and reward sampling.
//!
//! Leaf-first: [`quota`] → [`limiter`], [`challenge`], [`random`] →
//! [`sampler`], all composed by [`pipeline`].

pub mod challenge;
pub mod limiter;
pub mod pipeline;
pub mod quota;
pub mod random;
pub mod sampler;

pub use challenge::{
    ChallengeContext, ChallengeVerifier, PermissiveVerifier, TurnstileVerifier, VerificationError,
};
pub use limiter::{Limiter, QuotaKeys, RateLimitError, RateLimiterSet};
pub use pipeline::{PullError, PullPipeline, PullRequest, MULTI_PULL};
pub use quota::{MemoryQuotaStore, QuotaGrant, QuotaRejected, QuotaStore};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use sampler::{RewardSampler, TicketPool};
