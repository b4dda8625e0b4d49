use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reward::RewardTier;

/// Reward tier table and ticket pool sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Cumulative tier thresholds, rarest first.
    #[serde(default = "d_tiers")]
    pub tiers: Vec<RewardTier>,
    /// Environment variable holding the delimited ticket pool.
    #[serde(default = "d_pool_env")]
    pub pool_env: String,
    #[serde(default = "d_pool_delimiter")]
    pub pool_delimiter: String,
    /// Used when `pool_env` is unset or empty.
    #[serde(default)]
    pub pool: Vec<String>,
    /// Fixed seed for reproducible draws.  Leave unset in production.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            tiers: d_tiers(),
            pool_env: d_pool_env(),
            pool_delimiter: d_pool_delimiter(),
            pool: Vec::new(),
            seed: None,
        }
    }
}

impl RewardsConfig {
    /// Resolve the ticket pool: the env var wins over the inline list.
    pub fn resolve_pool(&self) -> Result<Vec<String>> {
        match std::env::var(&self.pool_env) {
            Ok(raw) if !raw.trim().is_empty() => Ok(parse_pool(&raw, &self.pool_delimiter)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(self
                .pool
                .iter()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect()),
            Err(std::env::VarError::NotUnicode(_)) => Err(Error::Config(format!(
                "{} is not valid unicode",
                self.pool_env
            ))),
        }
    }
}

/// Split a delimited ticket list, dropping blanks.
pub fn parse_pool(raw: &str, delimiter: &str) -> Vec<String> {
    let delimiter = if delimiter.is_empty() { "," } else { delimiter };
    raw.split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn d_tiers() -> Vec<RewardTier> {
    vec![RewardTier::new("ticket", 0.0001)]
}
fn d_pool_env() -> String {
    "POOL".into()
}
fn d_pool_delimiter() -> String {
    ",".into()
}
