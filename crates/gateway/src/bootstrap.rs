//! AppState construction and background-task spawning extracted from `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use gacha_domain::config::{Config, ConfigSeverity};
use gacha_domain::reward::RewardTable;

use crate::runtime::{
    ChallengeVerifier, PermissiveVerifier, PullPipeline, RandomSource, RateLimiterSet,
    RewardSampler, SeededRandom, ThreadRandom, TicketPool, TurnstileVerifier,
};
use crate::state::AppState;

/// How often expired quota buckets are dropped.
const QUOTA_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Validate config, construct every service once and return a fully-wired
/// [`AppState`].  Misconfiguration (bad tiers, empty pool) fails here, never
/// per request.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Reward tiers ─────────────────────────────────────────────────
    let table = RewardTable::new(config.rewards.tiers.clone()).context("loading reward tiers")?;
    tracing::info!(
        tiers = table.len(),
        top = %table.top().name,
        top_threshold = table.top().threshold,
        "reward table ready"
    );

    // ── Ticket pool ──────────────────────────────────────────────────
    let tickets = config.rewards.resolve_pool().context("resolving ticket pool")?;
    if tickets.is_empty() {
        anyhow::bail!(
            "ticket pool is empty: set {} or rewards.pool",
            config.rewards.pool_env
        );
    }
    table
        .ensure_distinct_from(&tickets)
        .context("checking ticket pool against reward tiers")?;
    let pool = TicketPool::new(tickets);
    tracing::info!(pool_size = pool.len(), "ticket pool ready");

    // ── Random source ────────────────────────────────────────────────
    let rng: Arc<dyn RandomSource> = match config.rewards.seed {
        Some(seed) => {
            tracing::warn!(seed, "rewards.seed is set, draws are reproducible");
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    // ── Challenge verifier ───────────────────────────────────────────
    let verifier: Arc<dyn ChallengeVerifier> = match config.challenge.secret() {
        Some(secret) => {
            let v = TurnstileVerifier::new(&config.challenge, secret)
                .context("building challenge verification client")?;
            tracing::info!(
                url = %config.challenge.verify_url,
                timeout_ms = config.challenge.timeout_ms,
                "challenge verifier ready"
            );
            Arc::new(v)
        }
        None => {
            tracing::warn!(
                env = %config.challenge.secret_env,
                "no challenge secret configured, any non-empty token is accepted (dev mode)"
            );
            Arc::new(PermissiveVerifier)
        }
    };

    // ── Rate limiters ────────────────────────────────────────────────
    let limiters = Arc::new(RateLimiterSet::from_config(&config.limits));
    tracing::info!(
        ip_points = config.limits.ip.points,
        ip_window_secs = config.limits.ip.window_secs,
        uid_points = config.limits.uid.points,
        uid_window_secs = config.limits.uid.window_secs,
        bot_points = config.limits.bot.points,
        bot_window_secs = config.limits.bot.window_secs,
        "rate limiters ready"
    );

    let pipeline = Arc::new(PullPipeline::new(
        verifier,
        limiters,
        RewardSampler::new(table),
        pool,
        rng,
    ));

    Ok(AppState { config, pipeline })
}

/// Spawn long-running maintenance loops.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic quota bucket pruning ────────────────────────────────
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(QUOTA_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = pipeline.limiters().prune_expired();
            if removed > 0 {
                tracing::debug!(removed, "pruned expired quota buckets");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_domain::reward::RewardTier;

    fn config_with_pool(pool: &[&str]) -> Config {
        let mut config = Config::default();
        config.rewards.pool_env = "GACHA_TEST_BOOTSTRAP_POOL_NEVER_SET".into();
        config.rewards.pool = pool.iter().map(|s| s.to_string()).collect();
        config.challenge.secret_env = "GACHA_TEST_BOOTSTRAP_SECRET_NEVER_SET".into();
        config
    }

    #[test]
    fn builds_with_inline_pool() {
        let state = build_app_state(Arc::new(config_with_pool(&["A", "B"]))).unwrap();
        assert_eq!(state.pipeline.pool().len(), 2);
        assert_eq!(state.pipeline.sampler().table().len(), 1);
    }

    #[test]
    fn empty_pool_is_fatal() {
        let err = build_app_state(Arc::new(config_with_pool(&[]))).err().unwrap();
        assert!(err.to_string().contains("ticket pool is empty"));
    }

    #[test]
    fn ticket_named_like_a_tier_is_fatal() {
        let mut config = config_with_pool(&["A", "sr"]);
        config.rewards.tiers = vec![RewardTier::new("ticket", 0.01), RewardTier::new("sr", 0.2)];
        let err = build_app_state(Arc::new(config)).err().unwrap();
        assert!(format!("{err:#}").contains("`sr`"));
    }

    #[test]
    fn malformed_tiers_are_fatal() {
        let mut config = config_with_pool(&["A"]);
        config.rewards.tiers = vec![RewardTier::new("a", 0.4), RewardTier::new("b", 0.1)];
        assert!(build_app_state(Arc::new(config)).is_err());
    }
}
