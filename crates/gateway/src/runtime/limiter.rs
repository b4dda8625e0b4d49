//! The three admission quotas (caller IP, session uid, anti-bot cookie).
//!
//! Every present key consumes one point from its own store in a single
//! attempt.  Points taken by limiters that accepted are kept even when
//! another limiter rejects, so the set throttles attempts rather than
//! successes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gacha_domain::config::LimitsConfig;
use gacha_domain::trace::TraceEvent;

use super::quota::{MemoryQuotaStore, QuotaStore};

/// Which quota tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limiter {
    Ip,
    Uid,
    BotCookie,
}

impl Limiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Limiter::Ip => "ip",
            Limiter::Uid => "uid",
            Limiter::BotCookie => "bot",
        }
    }
}

impl fmt::Display for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys for one admission attempt.  `uid` is mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaKeys<'a> {
    pub ip: Option<&'a str>,
    pub uid: Option<&'a str>,
    pub bot_cookie: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("missing uid")]
    MissingUid,
    #[error("{limiter} quota exceeded")]
    QuotaExceeded {
        limiter: Limiter,
        retry_after: Duration,
    },
}

pub struct RateLimiterSet {
    ip: Arc<dyn QuotaStore>,
    uid: Arc<dyn QuotaStore>,
    bot: Arc<dyn QuotaStore>,
}

impl RateLimiterSet {
    pub fn new(ip: Arc<dyn QuotaStore>, uid: Arc<dyn QuotaStore>, bot: Arc<dyn QuotaStore>) -> Self {
        Self { ip, uid, bot }
    }

    /// In-memory stores built from the configured policies.
    pub fn from_config(cfg: &LimitsConfig) -> Self {
        Self::new(
            Arc::new(MemoryQuotaStore::new(cfg.ip)),
            Arc::new(MemoryQuotaStore::new(cfg.uid)),
            Arc::new(MemoryQuotaStore::new(cfg.bot)),
        )
    }

    /// Consume one point from every limiter whose key is present.
    ///
    /// All present limiters are attempted even after one rejects; the first
    /// rejection (in ip, uid, bot order) is reported.
    pub fn consume_all(&self, keys: &QuotaKeys<'_>) -> Result<(), RateLimitError> {
        let uid = keys
            .uid
            .filter(|u| !u.is_empty())
            .ok_or(RateLimitError::MissingUid)?;

        let attempts = [
            (Limiter::Ip, keys.ip),
            (Limiter::Uid, Some(uid)),
            (Limiter::BotCookie, keys.bot_cookie),
        ];

        let mut first_failure = None;
        for (limiter, key) in attempts {
            let Some(key) = key.filter(|k| !k.is_empty()) else {
                continue;
            };
            if let Err(rejected) = self.store(limiter).try_consume(key, 1) {
                tracing::debug!(
                    limiter = limiter.as_str(),
                    consumed = rejected.consumed,
                    "quota exhausted"
                );
                first_failure.get_or_insert(RateLimitError::QuotaExceeded {
                    limiter,
                    retry_after: rejected.retry_after,
                });
            }
        }

        match first_failure {
            Some(err) => {
                if let RateLimitError::QuotaExceeded {
                    limiter,
                    retry_after,
                } = &err
                {
                    TraceEvent::QuotaRejected {
                        limiter: limiter.to_string(),
                        retry_after_ms: retry_after.as_millis() as u64,
                    }
                    .emit();
                }
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Points `key` has consumed from `limiter` in its current window.
    pub fn consumed(&self, limiter: Limiter, key: &str) -> u32 {
        self.store(limiter).consumed(key)
    }

    /// Drop expired buckets from all three stores.
    pub fn prune_expired(&self) -> usize {
        self.ip.prune_expired() + self.uid.prune_expired() + self.bot.prune_expired()
    }

    fn store(&self, limiter: Limiter) -> &dyn QuotaStore {
        match limiter {
            Limiter::Ip => self.ip.as_ref(),
            Limiter::Uid => self.uid.as_ref(),
            Limiter::BotCookie => self.bot.as_ref(),
        }
    }
}
