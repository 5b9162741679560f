use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use traffic_stats::counters::{CounterSource, ProcessScopedCounters, SystemWideCounters};
use traffic_stats::*;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let system_wide: Arc<dyn CounterSource> = Arc::new(SystemWideCounters::new());
    let process_scoped: Arc<dyn CounterSource> = Arc::new(ProcessScopedCounters::new());
    let (reachability_rx, _watcher) =
        reachability::spawn_reachability_watcher(app_config.sampling.reachability_poll_ms);

    let emitter = Arc::new(monitor::Emitter::new(
        monitor::EmitterDeps {
            system_wide,
            process_scoped,
            reachability_rx,
        },
        monitor::EmitterConfig {
            interval_ms: app_config.sampling.interval_ms,
            channel_capacity: app_config.sampling.channel_capacity,
            usage_interval_secs: app_config.sampling.usage_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    ));
    let info = Arc::new(models::MonitorInfo {
        uid: std::process::id(),
        sample_interval_ms: app_config.sampling.interval_ms,
        usage_interval_secs: app_config.sampling.usage_interval_secs,
    });
    let ws_connections = Arc::new(AtomicUsize::new(0));

    let app = routes::app(emitter.clone(), info, ws_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                emitter.stop_all();
            }
        }
    }

    Ok(())
}
