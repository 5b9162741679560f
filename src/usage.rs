// Asynchronous usage-metrics reporter (low-frequency cumulative totals,
// merged into statistics records by the session on arrival)

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};

use crate::counters::CounterSource;

/// Cumulative usage payload delivered out of band, at a much lower
/// cadence than the speed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageTotals {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

/// Spawns the reporter task: reads cumulative totals every `period` and
/// sends them to the owning session. Read failures are logged and that
/// delivery skipped. The task exits as soon as the receiving half is
/// dropped (session teardown), so a delivery racing an unsubscribe lands
/// on a closed channel and is discarded.
pub fn spawn_usage_reporter(
    source: Arc<dyn CounterSource>,
    period: Duration,
    tx: mpsc::Sender<UsageTotals>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // interval fires immediately; the first report waits a full period
        tick.tick().await;
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let totals = match source.read_counters() {
                        Ok(c) => UsageTotals {
                            tx_bytes: c.sent_bytes,
                            rx_bytes: c.received_bytes,
                        },
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "read_usage",
                                "usage read failed; skipping delivery"
                            );
                            continue;
                        }
                    };
                    if tx.send(totals).await.is_err() {
                        break;
                    }
                }
                _ = tx.closed() => break,
            }
        }
        tracing::debug!("usage reporter shutting down");
    })
}
