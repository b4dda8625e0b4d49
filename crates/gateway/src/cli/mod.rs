pub mod config;

use clap::{Parser, Subcommand};

/// gachagate: a challenge-gated, rate-limited gacha pull service.
#[derive(Debug, Parser)]
#[command(name = "gachagate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the pull server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GACHA_CONFIG";

/// Load the configuration from the path specified by `GACHA_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.  A missing file yields the built-in defaults.
///
/// [`Config`]: gacha_domain::config::Config
pub fn load_config() -> anyhow::Result<(gacha_domain::config::Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// Load a config file from an explicit path, falling back to defaults when
/// the file does not exist.
pub fn load_config_from(config_path: &str) -> anyhow::Result<gacha_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(gacha_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}
