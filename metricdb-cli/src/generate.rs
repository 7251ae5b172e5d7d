//! Synthetic sample generation for load testing
//!
//! Timestamps advance with random jitter, including small backwards steps,
//! and one percent of them are swapped with a neighbour up to 100 positions
//! away. The result models metrics that mostly arrive in order but are
//! occasionally late.

use metricdb_core::{MetricKey, Sample, Timestamp};
use rand::Rng;

/// Jittered, locally shuffled timestamps from `start` up to `max`
pub fn timestamps<R: Rng>(rng: &mut R, start: Timestamp, max: Timestamp) -> Vec<Timestamp> {
    let mut timestamps = Vec::new();
    let mut ts = start;
    while ts < max {
        timestamps.push(ts);
        ts = ts.saturating_add(rng.gen_range(-20..50));
    }

    // Shuffling needs room on both sides of the chosen index
    if timestamps.len() > 400 {
        for _ in 0..timestamps.len() / 100 {
            let i = rng.gen_range(200..timestamps.len() - 200);
            let j = (i as i64 + rng.gen_range(-100..100)) as usize;
            timestamps.swap(i, j);
        }
    }
    timestamps
}

/// Samples for one key, every value equal to `value`
pub fn samples<R: Rng>(
    rng: &mut R,
    key: MetricKey,
    start: Timestamp,
    max: Timestamp,
    value: i32,
) -> Vec<Sample> {
    timestamps(rng, start, max)
        .into_iter()
        .map(|ts| Sample::new(ts, key, value))
        .collect()
}
