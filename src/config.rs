use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Tick cadence for speed computation (ms). Constant within a session.
    pub interval_ms: u64,
    /// Per-session record channel capacity (slow subscribers hit backpressure).
    pub channel_capacity: usize,
    /// How often the reachability watcher re-reads interface state (ms).
    pub reachability_poll_ms: u64,
    /// Cadence of the asynchronous usage-metrics reporter (seconds).
    #[serde(default = "default_usage_interval_secs")]
    pub usage_interval_secs: u64,
}

fn default_usage_interval_secs() -> u64 {
    86_400
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often an active session logs app stats (records emitted, ticks skipped) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.channel_capacity > 0,
            "sampling.channel_capacity must be > 0, got {}",
            self.sampling.channel_capacity
        );
        anyhow::ensure!(
            self.sampling.reachability_poll_ms > 0,
            "sampling.reachability_poll_ms must be > 0, got {}",
            self.sampling.reachability_poll_ms
        );
        anyhow::ensure!(
            self.sampling.usage_interval_secs > 0,
            "sampling.usage_interval_secs must be > 0, got {}",
            self.sampling.usage_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
