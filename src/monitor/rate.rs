use std::fmt::{self, Display, Formatter};
use std::time::Instant;

const UJ_PER_JOULE: f64 = 1_000_000.0;

/// One reading of the energy counter and the monotonic time it was taken.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    /// Cumulative energy in µJ.
    pub energy_uj: u64,
    pub timestamp: Instant,
}

impl Sample {
    #[must_use]
    pub fn new(energy_uj: u64, timestamp: Instant) -> Self {
        Self {
            energy_uj,
            timestamp,
        }
    }
}

/// Why no power figure came out of an update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Skip {
    /// The counter went backwards (reset or wraparound). Re-baselined.
    CounterReset,
    /// No measurable time since the baseline. Baseline kept.
    ZeroInterval,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Rate {
    Watts(f64),
    Skipped(Skip),
}

impl Display for Rate {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Rate::Watts(watts) => write!(f, "{watts:.2} W"),
            Rate::Skipped(Skip::CounterReset) => write!(f, "skipped (counter reset)"),
            Rate::Skipped(Skip::ZeroInterval) => write!(f, "skipped (zero interval)"),
        }
    }
}

/// Convert the energy used since `previous` into watts.
///
/// Returns the rate and the sample to compare the next reading against.
#[must_use]
pub fn update(previous: Sample, current_value: u64, current_time: Instant) -> (Rate, Sample) {
    let current = Sample::new(current_value, current_time);
    if current_value < previous.energy_uj {
        return (Rate::Skipped(Skip::CounterReset), current);
    }

    // saturates to zero if the clock appears to have gone backwards
    let elapsed = current_time
        .saturating_duration_since(previous.timestamp)
        .as_secs_f64();
    if elapsed == 0.0 {
        return (Rate::Skipped(Skip::ZeroInterval), previous);
    }

    let joules = (current_value - previous.energy_uj) as f64 / UJ_PER_JOULE;
    (Rate::Watts(joules / elapsed), current)
}

/// Owns the baseline carried from one reading to the next.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    baseline: Sample,
}

impl RateEstimator {
    #[must_use]
    pub fn new(baseline: Sample) -> Self {
        Self { baseline }
    }

    #[must_use]
    pub fn baseline(&self) -> Sample {
        self.baseline
    }

    pub fn update(&mut self, current_value: u64, current_time: Instant) -> Rate {
        let (rate, baseline) = update(self.baseline, current_value, current_time);
        self.baseline = baseline;
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(origin: Instant, secs: f64) -> Instant {
        origin + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_one_watt() {
        let t0 = Instant::now();
        let previous = Sample::new(1_000_000, t0);
        let (rate, next) = update(previous, 3_500_000, at(t0, 2.5));
        assert_eq!(rate, Rate::Watts(1.0));
        assert_eq!(next, Sample::new(3_500_000, at(t0, 2.5)));
    }

    #[test]
    fn test_rate_formula_over_several_intervals() {
        let t0 = Instant::now();
        for (delta_uj, secs) in [(0_u64, 1.0), (45_000_000, 1.0), (12_345_678, 0.25), (1, 3.0)] {
            let previous = Sample::new(7_000, t0);
            let (rate, next) = update(previous, 7_000 + delta_uj, at(t0, secs));
            let expected = (delta_uj as f64 / 1e6) / secs;
            match rate {
                Rate::Watts(watts) => assert!((watts - expected).abs() < 1e-9, "{watts} != {expected}"),
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(next.energy_uj, 7_000 + delta_uj);
            assert_eq!(next.timestamp, at(t0, secs));
        }
    }

    #[test]
    fn test_wraparound_rebaselines() {
        let t0 = Instant::now();
        let previous = Sample::new(9_000_000, at(t0, 10.0));
        let (rate, next) = update(previous, 500_000, at(t0, 11.0));
        assert_eq!(rate, Rate::Skipped(Skip::CounterReset));
        assert_eq!(next, Sample::new(500_000, at(t0, 11.0)));
    }

    #[test]
    fn test_zero_interval_keeps_baseline() {
        let t0 = Instant::now();
        let previous = Sample::new(1_000, t0);
        for value in [1_000, 2_000, u64::MAX] {
            let (rate, next) = update(previous, value, t0);
            assert_eq!(rate, Rate::Skipped(Skip::ZeroInterval));
            assert_eq!(next, previous);
        }
    }

    #[test]
    fn test_estimator_carries_baseline() {
        let t0 = Instant::now();
        let mut estimator = RateEstimator::new(Sample::new(0, t0));
        assert_eq!(estimator.update(2_000_000, at(t0, 1.0)), Rate::Watts(2.0));
        assert_eq!(estimator.update(2_500_000, at(t0, 1.0)), Rate::Skipped(Skip::ZeroInterval));
        assert_eq!(estimator.update(100, at(t0, 2.0)), Rate::Skipped(Skip::CounterReset));
        assert_eq!(estimator.baseline(), Sample::new(100, at(t0, 2.0)));
        assert_eq!(estimator.update(4_000_100, at(t0, 4.0)), Rate::Watts(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rate::Watts(12.346).to_string(), "12.35 W");
        assert_eq!(Rate::Skipped(Skip::CounterReset).to_string(), "skipped (counter reset)");
    }
}
