// Counter sources: cumulative network byte counts via sysinfo / procfs

#[cfg(target_os = "linux")]
mod linux;

use std::sync::Mutex;
use sysinfo::Networks;
use thiserror::Error;

/// Cumulative received/sent byte counts at one point in time.
/// Non-decreasing within a session unless the OS resets a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub received_bytes: u64,
    pub sent_bytes: u64,
}

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter source unavailable: {0}")]
    Unavailable(String),
    #[error("counter read: {0}")]
    Io(#[from] std::io::Error),
}

/// Read cumulative byte counters at call time. A failed read is
/// recoverable: the caller skips the tick and tries again next interval.
pub trait CounterSource: Send + Sync {
    fn read_counters(&self) -> Result<Counters, CounterError>;
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0")
}

/// System-wide totals: sum of all non-loopback interfaces.
pub struct SystemWideCounters {
    networks: Mutex<Networks>,
}

impl Default for SystemWideCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemWideCounters {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl CounterSource for SystemWideCounters {
    fn read_counters(&self) -> Result<Counters, CounterError> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| CounterError::Unavailable(format!("networks lock poisoned: {}", e)))?;
        networks.refresh(true);
        let mut totals = Counters::default();
        for (name, data) in networks.list() {
            if is_loopback(name) {
                continue;
            }
            totals.received_bytes += data.total_received();
            totals.sent_bytes += data.total_transmitted();
        }
        Ok(totals)
    }
}

/// Process-scoped totals. On Linux this reads `/proc/self/net/dev`
/// (counters of the process's network namespace); elsewhere it falls
/// back to system-wide totals.
pub struct ProcessScopedCounters {
    #[cfg(not(target_os = "linux"))]
    fallback: SystemWideCounters,
}

impl Default for ProcessScopedCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessScopedCounters {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "linux"))]
            fallback: SystemWideCounters::new(),
        }
    }
}

impl CounterSource for ProcessScopedCounters {
    fn read_counters(&self) -> Result<Counters, CounterError> {
        #[cfg(target_os = "linux")]
        {
            linux::read_proc_net_dev()
        }
        #[cfg(not(target_os = "linux"))]
        {
            self.fallback.read_counters()
        }
    }
}
