use gacha_domain::config::{Config, ConfigSeverity};
use gacha_domain::reward::RewardTable;

/// Parse and validate the config, printing any issues.
///
/// Also resolves the ticket pool, since an empty pool stops `serve`.
/// Returns `false` when errors are found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    let mut pool_error = None;
    match config.rewards.resolve_pool() {
        Ok(pool) if pool.is_empty() => {
            pool_error = Some(format!(
                "[ERROR] rewards.pool: ticket pool is empty (set {} or rewards.pool)",
                config.rewards.pool_env
            ));
        }
        Ok(pool) => {
            println!("Ticket pool: {} entr(ies)", pool.len());
            if let Ok(table) = RewardTable::new(config.rewards.tiers.clone()) {
                if let Err(e) = table.ensure_distinct_from(&pool) {
                    pool_error = Some(format!("[ERROR] rewards.pool: {e}"));
                }
            }
        }
        Err(e) => pool_error = Some(format!("[ERROR] rewards.pool: {e}")),
    }

    if issues.is_empty() && pool_error.is_none() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count()
        + usize::from(pool_error.is_some());
    let warning_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Warning)
        .count();

    for issue in &issues {
        println!("{issue}");
    }
    if let Some(msg) = &pool_error {
        println!("{msg}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}
