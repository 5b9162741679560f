// Event emitter: one session slot per channel, a single tick task per
// session owning all rate state (same shape as a background stats worker:
// interval + select loop, warn-and-continue on a failed read).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, interval};
use tracing::Instrument;

use crate::counters::CounterSource;
use crate::models::{SpeedRecord, StatsRecord, TrafficRecord};
use crate::reachability::Reachability;
use crate::sampler::{RateEngine, Reading, Sample};
use crate::usage::{UsageTotals, spawn_usage_reporter};

/// The two subscribable channels and their wire shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Speed,
    Statistics,
}

/// Identifies one started session; `stop` with a stale token is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct SessionToken {
    kind: ChannelKind,
    id: u64,
}

/// Counter sources and reachability feed shared by all sessions.
pub struct EmitterDeps {
    pub system_wide: Arc<dyn CounterSource>,
    pub process_scoped: Arc<dyn CounterSource>,
    pub reachability_rx: watch::Receiver<Reachability>,
}

/// Session timing and logging config.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    pub interval_ms: u64,
    pub channel_capacity: usize,
    pub usage_interval_secs: u64,
    pub stats_log_interval_secs: u64,
}

struct SessionHandle {
    id: u64,
    shutdown_tx: oneshot::Sender<()>,
}

/// Subscription boundary: `start` begins a session (displacing any prior
/// one on the same channel), `stop` ends it. At most one session per
/// channel; all session state lives in the spawned task.
pub struct Emitter {
    deps: EmitterDeps,
    config: EmitterConfig,
    next_id: AtomicU64,
    speed_slot: Mutex<Option<SessionHandle>>,
    stats_slot: Mutex<Option<SessionHandle>>,
}

impl Emitter {
    pub fn new(deps: EmitterDeps, config: EmitterConfig) -> Self {
        Self {
            deps,
            config,
            next_id: AtomicU64::new(1),
            speed_slot: Mutex::new(None),
            stats_slot: Mutex::new(None),
        }
    }

    fn slot(&self, kind: ChannelKind) -> &Mutex<Option<SessionHandle>> {
        match kind {
            ChannelKind::Speed => &self.speed_slot,
            ChannelKind::Statistics => &self.stats_slot,
        }
    }

    /// Starts a session on `kind`, tearing down any active session on
    /// that channel first (no overlapping timers). Returns the record
    /// stream for the subscriber; it closes when the session is
    /// displaced or stopped.
    pub fn start(
        &self,
        kind: ChannelKind,
    ) -> anyhow::Result<(SessionToken, mpsc::Receiver<TrafficRecord>)> {
        let mut slot = self
            .slot(kind)
            .lock()
            .map_err(|e| anyhow::anyhow!("session slot lock poisoned: {}", e))?;
        // Previous session goes down before the new timer starts.
        if let Some(old) = slot.take() {
            tracing::debug!(channel = ?kind, "displacing previous session");
            let _ = old.shutdown_tx.send(());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        spawn_session(kind, tx, shutdown_rx, &self.deps, &self.config);
        *slot = Some(SessionHandle { id, shutdown_tx });
        Ok((SessionToken { kind, id }, rx))
    }

    /// Stops the session identified by `token`. Idempotent: a stale or
    /// already-stopped token is a no-op.
    pub fn stop(&self, token: SessionToken) {
        let Ok(mut slot) = self.slot(token.kind).lock() else {
            return;
        };
        if slot.as_ref().is_some_and(|h| h.id == token.id)
            && let Some(handle) = slot.take()
        {
            let _ = handle.shutdown_tx.send(());
        }
    }

    /// Tears down whatever is active on both channels (server shutdown).
    pub fn stop_all(&self) {
        for kind in [ChannelKind::Speed, ChannelKind::Statistics] {
            if let Ok(mut slot) = self.slot(kind).lock()
                && let Some(handle) = slot.take()
            {
                let _ = handle.shutdown_tx.send(());
            }
        }
    }
}

fn zero_record(kind: ChannelKind, uid: u32) -> TrafficRecord {
    match kind {
        ChannelKind::Speed => TrafficRecord::Speed(SpeedRecord::zero()),
        ChannelKind::Statistics => TrafficRecord::Statistics(StatsRecord::zero(uid)),
    }
}

fn spawn_session(
    kind: ChannelKind,
    tx: mpsc::Sender<TrafficRecord>,
    mut shutdown_rx: oneshot::Receiver<()>,
    deps: &EmitterDeps,
    config: &EmitterConfig,
) -> tokio::task::JoinHandle<()> {
    // Speed sessions measure system-wide traffic; statistics sessions
    // measure the process scope and carry system-wide totals alongside.
    let session_source = match kind {
        ChannelKind::Speed => deps.system_wide.clone(),
        ChannelKind::Statistics => deps.process_scoped.clone(),
    };
    let system_wide = deps.system_wide.clone();
    let mut reachability_rx = deps.reachability_rx.clone();
    let interval_ms = config.interval_ms;
    let usage_interval_secs = config.usage_interval_secs;
    let stats_log_interval = Duration::from_secs(config.stats_log_interval_secs);

    let session_span =
        tracing::span!(tracing::Level::DEBUG, "session", channel = ?kind, interval_ms);
    let session = async move {
        let uid = std::process::id();
        let mut engine = RateEngine::new();
        let mut all_engine = RateEngine::new();
        let mut last_reading = Reading::zero();
        let mut records_emitted: u64 = 0;
        let mut ticks_skipped: u64 = 0;
        let mut suspended = !reachability_rx.borrow().is_reachable();
        let mut watch_alive = true;

        let mut tick = interval(Duration::from_millis(interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Usage deliveries only feed the statistics shape. The session
        // owns the receiver; dropping it on teardown ends the reporter.
        let mut usage_rx = match kind {
            ChannelKind::Statistics => {
                let (usage_tx, usage_rx) = mpsc::channel(4);
                spawn_usage_reporter(
                    system_wide.clone(),
                    Duration::from_secs(usage_interval_secs),
                    usage_tx,
                );
                Some(usage_rx)
            }
            ChannelKind::Speed => None,
        };

        tracing::info!(channel = ?kind, "session started");

        loop {
            tokio::select! {
                _ = tick.tick(), if !suspended => {
                    let counters = match session_source.read_counters() {
                        Ok(c) => c,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "read_counters",
                                "counter read failed; skipping tick"
                            );
                            ticks_skipped += 1;
                            continue;
                        }
                    };
                    // Both reads happen before any engine state moves:
                    // a failed read skips the whole tick.
                    let all_counters = match kind {
                        ChannelKind::Speed => None,
                        ChannelKind::Statistics => match system_wide.read_counters() {
                            Ok(c) => Some(c),
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    operation = "read_counters_all",
                                    "system-wide read failed; skipping tick"
                                );
                                ticks_skipped += 1;
                                continue;
                            }
                        },
                    };
                    let now = Instant::now();
                    let reading = engine.observe(Sample::new(counters, now));

                    let record = match all_counters {
                        None => TrafficRecord::Speed(SpeedRecord {
                            upload_speed: reading.upload_kbps,
                            download_speed: reading.download_kbps,
                        }),
                        Some(all_counters) => {
                            let all = all_engine.observe(Sample::new(all_counters, now));
                            TrafficRecord::Statistics(StatsRecord {
                                upload_speed: reading.upload_kbps,
                                download_speed: reading.download_kbps,
                                total_tx: reading.total_tx,
                                total_rx: reading.total_rx,
                                uid,
                                total_all_tx: all.total_tx,
                                total_all_rx: all.total_rx,
                            })
                        }
                    };
                    last_reading = reading;
                    if tx.try_send(record).is_ok() {
                        records_emitted += 1;
                    } else {
                        tracing::debug!("subscriber not draining; record dropped");
                    }
                }
                changed = reachability_rx.changed(), if watch_alive => {
                    if changed.is_err() {
                        // watcher gone; keep ticking with the last known state
                        watch_alive = false;
                        continue;
                    }
                    let state = *reachability_rx.borrow_and_update();
                    if state.is_reachable() {
                        if suspended {
                            tracing::info!(?state, "network reachable; resuming ticks");
                        }
                        // baseline untouched: cumulative totals continue
                        suspended = false;
                    } else {
                        tracing::info!("network unreachable; emitting zero record");
                        suspended = true;
                        if tx.try_send(zero_record(kind, uid)).is_ok() {
                            records_emitted += 1;
                        }
                    }
                }
                usage = recv_usage(&mut usage_rx) => {
                    let Some(totals) = usage else {
                        usage_rx = None;
                        continue;
                    };
                    let record = TrafficRecord::Statistics(merge_usage(&last_reading, totals, uid));
                    if tx.try_send(record).is_ok() {
                        records_emitted += 1;
                    }
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        channel = ?kind,
                        records_emitted,
                        ticks_skipped,
                        "session stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!(channel = ?kind, "session shutting down");
                    break;
                }
            }
        }
        // dropping the engines releases the baseline and last sample
    };
    tokio::spawn(session.instrument(session_span))
}

/// Pending forever when the channel is absent (speed sessions).
async fn recv_usage(rx: &mut Option<mpsc::Receiver<UsageTotals>>) -> Option<UsageTotals> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// A usage delivery re-emits the last computed speeds and scoped totals
/// with the delivered system-wide totals.
fn merge_usage(last: &Reading, totals: UsageTotals, uid: u32) -> StatsRecord {
    StatsRecord {
        upload_speed: last.upload_kbps,
        download_speed: last.download_kbps,
        total_tx: last.total_tx,
        total_rx: last.total_rx,
        uid,
        total_all_tx: totals.tx_bytes,
        total_all_rx: totals.rx_bytes,
    }
}
