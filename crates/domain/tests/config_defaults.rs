use gacha_domain::config::{Config, QuotaPolicy};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config
        .server
        .cors
        .allowed_origins
        .contains(&"http://localhost:*".to_string()));
    assert!(config
        .server
        .cors
        .allowed_origins
        .contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[challenge]
secret_env = "MY_SECRET"
timeout_ms = 2500

[limits]
bot_cookie = "fp"

[limits.ip]
points = 100
window_secs = 60

[rewards]
pool = ["T-1", "T-2"]
tiers = [
    { name = "ticket", threshold = 0.0001 },
    { name = "sr", threshold = 0.05 },
]

[observability]
service_name = "gacha-staging"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.challenge.secret_env, "MY_SECRET");
    assert_eq!(config.challenge.timeout_ms, 2500);
    assert_eq!(config.limits.ip, QuotaPolicy::new(100, 60));
    assert_eq!(config.limits.uid, QuotaPolicy::new(10, 5));
    assert_eq!(config.limits.bot_cookie, "fp");
    assert_eq!(config.rewards.pool.len(), 2);
    assert_eq!(config.rewards.tiers[1].name, "sr");
    assert_eq!(config.observability.service_name, "gacha-staging");
    assert!(config.validate().is_empty());
}

#[test]
fn default_rewards_mirror_single_ticket_rate() {
    let config = Config::default();
    assert_eq!(config.rewards.tiers.len(), 1);
    assert!((config.rewards.tiers[0].threshold - 0.0001).abs() < f64::EPSILON);
}
