// Linux: per-namespace counters from /proc/self/net/dev

use super::{CounterError, Counters};

pub(super) fn read_proc_net_dev() -> Result<Counters, CounterError> {
    let content = std::fs::read_to_string("/proc/self/net/dev")?;
    parse_net_dev(&content).ok_or_else(|| {
        CounterError::Unavailable("no interface rows in /proc/self/net/dev".into())
    })
}

/// Parse /proc/net/dev: two header lines, then one row per interface of
/// "name: rx_bytes <7 more receive fields> tx_bytes ...". Sums the
/// non-loopback rows; None when no row parses.
fn parse_net_dev(content: &str) -> Option<Counters> {
    let mut totals = Counters::default();
    let mut seen = false;
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        if super::is_loopback(name.trim()) {
            continue;
        }
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let (Some(rx), Some(tx)) = (
            fields.first().and_then(|f| f.parse::<u64>().ok()),
            fields.get(8).and_then(|f| f.parse::<u64>().ok()),
        ) else {
            continue;
        };
        totals.received_bytes += rx;
        totals.sent_bytes += tx;
        seen = true;
    }
    seen.then_some(totals)
}
