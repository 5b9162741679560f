// Emitted traffic records

use serde::{Deserialize, Serialize};

/// Minimal record of the speed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedRecord {
    /// Upload speed, kilobits (1000 bits) per second.
    pub upload_speed: i64,
    /// Download speed, kilobits (1000 bits) per second.
    pub download_speed: i64,
}

impl SpeedRecord {
    pub fn zero() -> Self {
        Self {
            upload_speed: 0,
            download_speed: 0,
        }
    }
}

/// Extended record of the statistics channel: speeds plus cumulative
/// usage since the session started, process-scoped and system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub upload_speed: i64,
    pub download_speed: i64,
    /// Bytes sent by this process since the session started.
    pub total_tx: u64,
    /// Bytes received by this process since the session started.
    pub total_rx: u64,
    /// Process identifier the scoped counters belong to.
    pub uid: u32,
    /// Bytes sent system-wide since the session started.
    pub total_all_tx: u64,
    /// Bytes received system-wide since the session started.
    pub total_all_rx: u64,
}

impl StatsRecord {
    pub fn zero(uid: u32) -> Self {
        Self {
            upload_speed: 0,
            download_speed: 0,
            total_tx: 0,
            total_rx: 0,
            uid,
            total_all_tx: 0,
            total_all_rx: 0,
        }
    }
}

/// One emission on either channel. Untagged: the inner record's keys are
/// the wire shape, with no wrapper object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TrafficRecord {
    Speed(SpeedRecord),
    Statistics(StatsRecord),
}
