// Config loading and validation tests

use traffic_stats::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[sampling]
interval_ms = 1000
channel_capacity = 32
reachability_poll_ms = 2000
usage_interval_secs = 86400

[monitoring]
stats_log_interval_secs = 60
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.sampling.interval_ms, 1000);
    assert_eq!(config.sampling.channel_capacity, 32);
    assert_eq!(config.sampling.reachability_poll_ms, 2000);
    assert_eq!(config.sampling.usage_interval_secs, 86400);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_usage_interval_defaults_to_daily() {
    let no_usage = VALID_CONFIG.replace("usage_interval_secs = 86400", "");
    let config = AppConfig::load_from_str(&no_usage).expect("load_from_str");
    assert_eq!(config.sampling.usage_interval_secs, 86400);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_interval_zero() {
    let bad = VALID_CONFIG.replace("interval_ms = 1000", "interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.interval_ms"));
}

#[test]
fn test_config_validation_rejects_channel_capacity_zero() {
    let bad = VALID_CONFIG.replace("channel_capacity = 32", "channel_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.channel_capacity"));
}

#[test]
fn test_config_validation_rejects_reachability_poll_zero() {
    let bad = VALID_CONFIG.replace("reachability_poll_ms = 2000", "reachability_poll_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.reachability_poll_ms"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace("stats_log_interval_secs = 60", "stats_log_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monitoring.stats_log_interval_secs"));
}

#[test]
fn test_config_rejects_missing_section() {
    let bad = VALID_CONFIG.replace("[monitoring]", "[other]");
    assert!(AppConfig::load_from_str(&bad).is_err());
}
