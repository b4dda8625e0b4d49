//! Fixed-window per-key quota counters.
//!
//! [`MemoryQuotaStore`] keeps one [`QuotaBucket`] per key.  The key map sits
//! behind a `parking_lot::RwLock` that is only write-locked to insert or
//! prune buckets; each bucket has its own `Mutex`, so consumes on the same
//! key are serialized while unrelated keys proceed in parallel.
//!
//! A window covers `[window_start, window_start + window]`, end inclusive:
//! a bucket resets only once `now` is strictly past the window end.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use gacha_domain::config::QuotaPolicy;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Consumption state for one key in the current window.
#[derive(Debug)]
struct QuotaBucket {
    consumed: u32,
    window_start: Instant,
}

impl QuotaBucket {
    fn expired(&self, window: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }

    fn roll(&mut self, window: Duration, now: Instant) {
        if self.expired(window, now) {
            self.window_start = now;
            self.consumed = 0;
        }
    }
}

/// Returned when a consume is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGrant {
    pub consumed: u32,
    pub remaining: u32,
}

/// Returned when a consume would exceed the policy.  The bucket is left
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRejected {
    pub consumed: u32,
    /// Time until the bucket's window ends.
    pub retry_after: Duration,
}

/// Storage contract for one quota policy.
///
/// Implementations must keep `consumed <= policy().points` at every
/// observable point, under any interleaving of concurrent consumes.
pub trait QuotaStore: Send + Sync {
    fn policy(&self) -> &QuotaPolicy;

    /// Try to take `points` from `key`'s bucket.
    fn try_consume(&self, key: &str, points: u32) -> Result<QuotaGrant, QuotaRejected>;

    /// Points consumed by `key` in its current window.
    fn consumed(&self, key: &str) -> u32;

    /// Drop buckets whose window has elapsed.  Returns how many were removed.
    fn prune_expired(&self) -> usize;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MemoryQuotaStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-process quota store.
pub struct MemoryQuotaStore {
    policy: QuotaPolicy,
    buckets: RwLock<HashMap<String, Arc<Mutex<QuotaBucket>>>>,
}

impl MemoryQuotaStore {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            policy,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Number of tracked keys (for monitoring).
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    /// [`QuotaStore::try_consume`] against an explicit clock reading.
    pub fn try_consume_at(
        &self,
        key: &str,
        points: u32,
        now: Instant,
    ) -> Result<QuotaGrant, QuotaRejected> {
        let bucket = self.bucket(key, now);
        let mut bucket = bucket.lock();
        let window = self.policy.window();
        bucket.roll(window, now);

        let next = bucket.consumed.saturating_add(points);
        if next > self.policy.points {
            let elapsed = now.saturating_duration_since(bucket.window_start);
            return Err(QuotaRejected {
                consumed: bucket.consumed,
                retry_after: window.saturating_sub(elapsed),
            });
        }

        bucket.consumed = next;
        Ok(QuotaGrant {
            consumed: next,
            remaining: self.policy.points - next,
        })
    }

    pub fn consumed_at(&self, key: &str, now: Instant) -> u32 {
        let bucket = match self.buckets.read().get(key) {
            Some(b) => b.clone(),
            None => return 0,
        };
        let bucket = bucket.lock();
        if bucket.expired(self.policy.window(), now) {
            0
        } else {
            bucket.consumed
        }
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let window = self.policy.window();
        let mut buckets = self.buckets.write();
        let before = buckets.len();
        // A bucket someone else still holds may be mid-consume; keep it.
        buckets.retain(|_, b| {
            Arc::strong_count(b) > 1 || !b.lock().expired(window, now)
        });
        before - buckets.len()
    }

    // ── Private ──────────────────────────────────────────────────────

    fn bucket(&self, key: &str, now: Instant) -> Arc<Mutex<QuotaBucket>> {
        if let Some(b) = self.buckets.read().get(key) {
            return b.clone();
        }
        self.buckets
            .write()
            .entry(key.to_owned())
            .or_insert_with(|| {
                Arc::new(Mutex::new(QuotaBucket {
                    consumed: 0,
                    window_start: now,
                }))
            })
            .clone()
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    fn try_consume(&self, key: &str, points: u32) -> Result<QuotaGrant, QuotaRejected> {
        self.try_consume_at(key, points, Instant::now())
    }

    fn consumed(&self, key: &str) -> u32 {
        self.consumed_at(key, Instant::now())
    }

    fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }
}
