// Library for tests to access modules

pub mod config;
pub mod counters;
pub mod models;
pub mod monitor;
pub mod reachability;
pub mod routes;
pub mod sampler;
pub mod usage;
