// Reachability: coarse connectivity state polled from interface state

use sysinfo::Networks;
use tokio::sync::watch;
use tokio::time::{Duration, interval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Unreachable,
    Wifi,
    Cellular,
}

impl Reachability {
    pub fn is_reachable(self) -> bool {
        !matches!(self, Reachability::Unreachable)
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0")
}

fn is_cellular(name: &str) -> bool {
    name.starts_with("wwan") || name.starts_with("pdp_ip")
}

/// Interface link state from /sys/class/net/<interface>/operstate (Linux).
/// Elsewhere an interface that has moved bytes counts as up.
fn is_up(name: &str, data: &sysinfo::NetworkData) -> bool {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/operstate", name);
        if let Ok(content) = std::fs::read_to_string(&path) {
            return content.trim() == "up";
        }
    }
    data.total_received() + data.total_transmitted() > 0
}

fn classify(networks: &mut Networks) -> Reachability {
    networks.refresh(true);
    let mut state = Reachability::Unreachable;
    for (name, data) in networks.list() {
        if is_loopback(name) || !is_up(name, data) {
            continue;
        }
        if is_cellular(name) {
            if state == Reachability::Unreachable {
                state = Reachability::Cellular;
            }
        } else {
            // any up non-cellular interface wins over cellular
            state = Reachability::Wifi;
        }
    }
    state
}

/// Spawns the watcher: polls interface state every `poll_ms` and
/// publishes only changes. The task exits when every receiver is gone.
pub fn spawn_reachability_watcher(
    poll_ms: u64,
) -> (watch::Receiver<Reachability>, tokio::task::JoinHandle<()>) {
    let mut networks = Networks::new_with_refreshed_list();
    let initial = classify(&mut networks);
    let (tx, rx) = watch::channel(initial);
    let handle = tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(poll_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let state = classify(&mut networks);
                    if *tx.borrow() != state {
                        tracing::info!(?state, "reachability changed");
                        let _ = tx.send(state);
                    }
                }
                _ = tx.closed() => break,
            }
        }
        tracing::debug!("reachability watcher shutting down");
    });
    (rx, handle)
}
