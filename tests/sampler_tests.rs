// Rate engine properties: baseline capture, clamps, kbps conversion

use std::time::{Duration, Instant};

use traffic_stats::counters::Counters;
use traffic_stats::sampler::{RateEngine, Reading, Sample};

mod common;
use common::counters;

fn sample(c: Counters, at: Instant) -> Sample {
    Sample::new(c, at)
}

#[test]
fn first_observation_reads_all_zero_and_sets_baseline() {
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    let reading = engine.observe(sample(counters(1000, 500), t0));
    assert_eq!(reading, Reading::zero());
    let baseline = engine.baseline().expect("baseline after first observation");
    assert_eq!(baseline.counters, counters(1000, 500));
}

#[test]
fn reference_sequence_one_second_apart() {
    // baseline rx=1000 tx=500, then rx=2024 tx=1524 after 1000 ms:
    // delta 1024 bytes each way -> 1024 * 8 / 1000 = 8 kbps
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    engine.observe(sample(counters(1000, 500), t0));
    let reading = engine.observe(sample(counters(2024, 1524), t0 + Duration::from_millis(1000)));
    assert_eq!(reading.upload_kbps, 8);
    assert_eq!(reading.download_kbps, 8);
    assert_eq!(reading.total_tx, 1024);
    assert_eq!(reading.total_rx, 1024);
}

#[test]
fn cumulative_totals_diff_against_baseline_every_tick() {
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    let script = [
        counters(100, 50),
        counters(100, 50),
        counters(5_100, 1_050),
        counters(90_100, 44_050),
    ];
    for (i, c) in script.iter().enumerate() {
        let reading = engine.observe(sample(*c, t0 + Duration::from_millis(1000 * i as u64)));
        assert_eq!(reading.total_rx, c.received_bytes - 100);
        assert_eq!(reading.total_tx, c.sent_bytes - 50);
        assert!(reading.upload_kbps >= 0);
        assert!(reading.download_kbps >= 0);
    }
    // baseline never moved
    assert_eq!(engine.baseline().unwrap().counters, counters(100, 50));
}

#[test]
fn zero_elapsed_clamps_to_one_millisecond() {
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    engine.observe(sample(counters(0, 0), t0));
    // same instant: elapsed clamps to 1 ms instead of dividing by zero
    let reading = engine.observe(sample(counters(5000, 5000), t0));
    assert_eq!(reading.upload_kbps, 40_000);
    assert_eq!(reading.download_kbps, 40_000);
}

#[test]
fn backwards_timestamp_produces_no_negative_rate() {
    let mut engine = RateEngine::new();
    let now = Instant::now();
    let earlier = now.checked_sub(Duration::from_secs(1)).unwrap_or(now);
    engine.observe(sample(counters(1000, 1000), now));
    let reading = engine.observe(sample(counters(3000, 3000), earlier));
    assert!(reading.upload_kbps >= 0);
    assert!(reading.download_kbps >= 0);
}

#[test]
fn counter_reset_clamps_delta_and_totals_to_zero() {
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    engine.observe(sample(counters(10_000, 10_000), t0));
    // simulated OS counter reset: counters went backwards
    let reading = engine.observe(sample(counters(100, 100), t0 + Duration::from_secs(1)));
    assert_eq!(reading.upload_kbps, 0);
    assert_eq!(reading.download_kbps, 0);
    assert_eq!(reading.total_tx, 0);
    assert_eq!(reading.total_rx, 0);
}

#[test]
fn reset_clears_baseline_and_last_sample() {
    let mut engine = RateEngine::new();
    let t0 = Instant::now();
    engine.observe(sample(counters(1000, 1000), t0));
    engine.observe(sample(counters(2000, 2000), t0 + Duration::from_secs(1)));
    engine.reset();
    assert!(engine.baseline().is_none());

    // next observation starts a fresh session with a new baseline
    let reading = engine.observe(sample(counters(9000, 9000), t0 + Duration::from_secs(2)));
    assert_eq!(reading, Reading::zero());
    assert_eq!(engine.baseline().unwrap().counters, counters(9000, 9000));
}
