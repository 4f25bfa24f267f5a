use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::ByteUnit;
use crate::sample::MetricSample;

/// What index 0 of a rate series reports, since it has no predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FirstRatePolicy {
    /// The raw cumulative counter scaled to the rate unit. Not a rate: the
    /// first point is in a different unit from the rest of the series.
    RawCounter,
    /// No value (`null` on the wire).
    Undefined,
}

/// Per-second rates of a cumulative counter, one per input sample.
///
/// `elapsed <= 0` (duplicate or out-of-order timestamps) gives 0, and a
/// decrease between neighbours (reboot, wraparound) is clamped to 0.
pub fn derive_rates(
    samples: &[MetricSample],
    counter: fn(&MetricSample) -> u64,
    unit: ByteUnit,
    first: FirstRatePolicy,
) -> Vec<Option<f64>> {
    let Some(head) = samples.first() else {
        return Vec::new();
    };

    let mut rates = Vec::with_capacity(samples.len());
    rates.push(match first {
        FirstRatePolicy::RawCounter => Some(unit.scale(counter(head) as f64)),
        FirstRatePolicy::Undefined => None,
    });

    rates.extend(samples.windows(2).map(|pair| {
        let (prev, cur) = (&pair[0], &pair[1]);
        let elapsed = (cur.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        if elapsed <= 0.0 {
            return Some(0.0);
        }
        let delta = counter(cur) as f64 - counter(prev) as f64;
        Some(unit.scale(delta / elapsed).max(0.0))
    }));

    rates
}

pub fn sent(s: &MetricSample) -> u64 {
    s.network_sent
}

pub fn recv(s: &MetricSample) -> u64 {
    s.network_recv
}
