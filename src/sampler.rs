// Rate engine: baseline capture, counter deltas, kbps conversion.
//
// Rate convention used everywhere in this crate: kilobits (1000 bits)
// per second, computed as delta_bytes * 8 / elapsed_ms. One formula,
// both channels.

use std::time::Instant;

use crate::counters::Counters;

/// One timestamped read of a counter source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub counters: Counters,
    pub taken_at: Instant,
}

impl Sample {
    pub fn new(counters: Counters, taken_at: Instant) -> Self {
        Self { counters, taken_at }
    }
}

/// Speeds and cumulative totals derived from one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub upload_kbps: i64,
    pub download_kbps: i64,
    /// Bytes sent since the baseline sample.
    pub total_tx: u64,
    /// Bytes received since the baseline sample.
    pub total_rx: u64,
}

impl Reading {
    pub fn zero() -> Self {
        Self {
            upload_kbps: 0,
            download_kbps: 0,
            total_tx: 0,
            total_rx: 0,
        }
    }
}

/// Per-session rate state. The baseline is captured lazily on the first
/// observation, at most once per session; only `reset` clears it.
/// `observe` must not run concurrently for one session (single-task
/// tick loop; the session task owns the engine).
#[derive(Debug, Default)]
pub struct RateEngine {
    baseline: Option<Sample>,
    prev: Option<Sample>,
}

impl RateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline of the current session, if one has been captured.
    pub fn baseline(&self) -> Option<Sample> {
        self.baseline
    }

    /// Feed one sample; returns the derived reading. The first
    /// observation of a session sets the baseline and reads all-zero.
    pub fn observe(&mut self, sample: Sample) -> Reading {
        let baseline = *self.baseline.get_or_insert(sample);
        let Some(prev) = self.prev.replace(sample) else {
            return Reading::zero();
        };

        // Clock anomaly or sub-granularity fire: clamp to 1 ms instead
        // of dividing by zero or going negative.
        let elapsed_ms = sample
            .taken_at
            .saturating_duration_since(prev.taken_at)
            .as_millis()
            .max(1) as u64;

        // A counter reset between ticks clamps the delta to zero.
        let delta_rx = sample
            .counters
            .received_bytes
            .saturating_sub(prev.counters.received_bytes);
        let delta_tx = sample
            .counters
            .sent_bytes
            .saturating_sub(prev.counters.sent_bytes);

        Reading {
            upload_kbps: (delta_tx * 8 / elapsed_ms) as i64,
            download_kbps: (delta_rx * 8 / elapsed_ms) as i64,
            total_tx: sample
                .counters
                .sent_bytes
                .saturating_sub(baseline.counters.sent_bytes),
            total_rx: sample
                .counters
                .received_bytes
                .saturating_sub(baseline.counters.received_bytes),
        }
    }

    /// Drop baseline and last sample (session teardown).
    pub fn reset(&mut self) {
        self.baseline = None;
        self.prev = None;
    }
}
