mod challenge;
mod observability;
mod quota;
mod rewards;
mod server;

pub use challenge::*;
pub use observability::*;
pub use quota::*;
pub use rewards::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reward::RewardTable;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.  The ticket pool is
    /// not checked here because it may come from the environment; startup
    /// rejects an empty resolved pool separately.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if let Some(header) = &self.server.client_ip_header {
            if header.trim().is_empty() {
                errors.push(ConfigError::error(
                    "server.client_ip_header",
                    "must not be empty when set (omit it to use the peer address)",
                ));
            }
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }

        if self.challenge.verify_url.is_empty() {
            errors.push(ConfigError::error(
                "challenge.verify_url",
                "verify_url must not be empty",
            ));
        } else if !self.challenge.verify_url.starts_with("https://") {
            errors.push(ConfigError::warning(
                "challenge.verify_url",
                "verification endpoint is not HTTPS",
            ));
        }
        if self.challenge.timeout_ms == 0 {
            errors.push(ConfigError::error(
                "challenge.timeout_ms",
                "timeout must be greater than 0",
            ));
        }
        if self.challenge.token_header.is_empty() {
            errors.push(ConfigError::error(
                "challenge.token_header",
                "token_header must not be empty",
            ));
        }

        for (name, policy) in [
            ("limits.ip", &self.limits.ip),
            ("limits.uid", &self.limits.uid),
            ("limits.bot", &self.limits.bot),
        ] {
            if policy.points == 0 {
                errors.push(ConfigError::error(
                    format!("{name}.points"),
                    "points must be greater than 0",
                ));
            }
            if policy.window_secs == 0 {
                errors.push(ConfigError::error(
                    format!("{name}.window_secs"),
                    "window must be greater than 0",
                ));
            }
        }
        if self.limits.bot_cookie.is_empty() {
            errors.push(ConfigError::error(
                "limits.bot_cookie",
                "cookie name must not be empty",
            ));
        }

        if let Err(e) = RewardTable::new(self.rewards.tiers.clone()) {
            errors.push(ConfigError::error("rewards.tiers", e.to_string()));
        }

        let rate = self.observability.sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                format!("sample_rate {rate} is outside [0, 1]"),
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::RewardTier;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn zero_points_is_an_error() {
        let mut config = Config::default();
        config.limits.bot.points = 0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "limits.bot.points");
        assert_eq!(issues[0].severity, ConfigSeverity::Error);
    }

    #[test]
    fn malformed_tiers_are_reported() {
        let mut config = Config::default();
        config.rewards.tiers = vec![RewardTier::new("a", 0.5), RewardTier::new("b", 0.3)];
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.field == "rewards.tiers"));
    }

    #[test]
    fn plain_http_verifier_is_only_a_warning() {
        let mut config = Config::default();
        config.challenge.verify_url = "http://127.0.0.1:9000/verify".into();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert!(issues[0].to_string().starts_with("[WARN] challenge.verify_url"));
    }

    #[test]
    fn blank_client_ip_header_is_an_error() {
        let mut config = Config::default();
        config.server.client_ip_header = Some("  ".into());
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "server.client_ip_header");
    }
}
