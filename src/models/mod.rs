// Wire models (emitted records keep the event-channel key names)

mod info;
mod record;

pub use info::MonitorInfo;
pub use record::{SpeedRecord, StatsRecord, TrafficRecord};
