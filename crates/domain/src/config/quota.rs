use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A fixed-window quota: at most `points` consumptions per `window_secs`.
///
/// Immutable once loaded; each limiter owns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub points: u32,
    pub window_secs: u64,
}

impl QuotaPolicy {
    pub const fn new(points: u32, window_secs: u64) -> Self {
        Self {
            points,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// The three independent admission quotas and the cookie that keys the
/// anti-bot one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Keyed by caller IP.
    #[serde(default = "d_ip")]
    pub ip: QuotaPolicy,
    /// Keyed by session id (`uid` query parameter).
    #[serde(default = "d_uid")]
    pub uid: QuotaPolicy,
    /// Keyed by the anti-bot fingerprint cookie.
    #[serde(default = "d_bot")]
    pub bot: QuotaPolicy,
    /// Name of the cookie holding the anti-bot fingerprint.
    #[serde(default = "d_bot_cookie")]
    pub bot_cookie: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            ip: d_ip(),
            uid: d_uid(),
            bot: d_bot(),
            bot_cookie: d_bot_cookie(),
        }
    }
}

fn d_ip() -> QuotaPolicy {
    QuotaPolicy::new(25, 10)
}
fn d_uid() -> QuotaPolicy {
    QuotaPolicy::new(10, 5)
}
fn d_bot() -> QuotaPolicy {
    QuotaPolicy::new(4, 6)
}
fn d_bot_cookie() -> String {
    "__cf_bm".into()
}
