// Static monitor identity for GET /api/info

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorInfo {
    pub uid: u32,
    pub sample_interval_ms: u64,
    pub usage_interval_secs: u64,
}
