use hdrhistogram::Histogram;
use serde::Serialize;

/// Latency summary for one measured operation (collector cycle, store
/// round-trip, HTTP request). `unit` names what the integers count.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileSet {
    pub unit: &'static str,
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
}

impl PercentileSet {
    /// Summarise `hist`; all zeros while it is empty.
    pub fn from_histogram(hist: &Histogram<u64>, unit: &'static str) -> Self {
        if hist.len() == 0 {
            return Self {
                unit,
                count: 0,
                min: 0,
                max: 0,
                mean: 0.0,
                p50: 0,
                p90: 0,
                p99: 0,
            };
        }

        Self {
            unit,
            count: hist.len(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p99: hist.value_at_quantile(0.99),
        }
    }
}

/// A histogram covering 1 up to `high` with 3 significant figures.
pub fn new_histogram(high: u64) -> Histogram<u64> {
    Histogram::new_with_bounds(1, high.max(2), 3).expect("histogram creation")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_is_zeroed() {
        let set = PercentileSet::from_histogram(&new_histogram(1_000), "ms");
        assert_eq!(set.count, 0);
        assert_eq!(set.p99, 0);
        assert_eq!(set.unit, "ms");
    }

    #[test]
    fn percentiles_track_recorded_values() {
        let mut hist = new_histogram(1_000_000);
        for v in 1..=100u64 {
            hist.record(v).unwrap();
        }
        let set = PercentileSet::from_histogram(&hist, "us");
        assert_eq!(set.count, 100);
        assert_eq!(set.min, 1);
        assert_eq!(set.max, 100);
        assert_eq!(set.p50, 50);
        assert_eq!(set.p90, 90);
    }
}
