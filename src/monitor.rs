pub mod rate;

use crate::error::MonitorError;
use crate::hwmon::EnergyCounter;
use crate::sink::Sink;
use log::{info, trace, warn};
use self::rate::{Rate, RateEstimator, Sample, Skip};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared stop flag. Cloning gives another handle on the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Source of monotonic time and of the pause between samples.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// What happened over the lifetime of a `run`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MonitorStats {
    pub ticks: u64,
    pub reported: u64,
    pub counter_resets: u64,
    pub zero_intervals: u64,
    pub read_failures: u64,
}

/// Polls an energy counter at a fixed cadence and turns it into watts.
pub struct Monitor<C, K> {
    counter: C,
    clock: K,
    interval: Duration,
    estimator: RateEstimator,
}

impl<C: EnergyCounter, K: Clock> Monitor<C, K> {
    /// Takes the initial baseline. A failed first read is fatal: there is
    /// nothing to measure the next reading against.
    pub fn new(mut counter: C, clock: K, interval: Duration) -> Result<Self, MonitorError> {
        let energy_uj = counter.read().map_err(MonitorError::InitialRead)?;
        let baseline = Sample::new(energy_uj, clock.now());
        trace!("MONITOR: baseline {energy_uj} µJ");
        Ok(Self {
            counter,
            clock,
            interval,
            estimator: RateEstimator::new(baseline),
        })
    }

    #[must_use]
    pub fn baseline(&self) -> Sample {
        self.estimator.baseline()
    }

    /// Sample until `token` is cancelled, forwarding each reading to `sinks`.
    ///
    /// The token is checked before and after each sleep. Read failures leave
    /// the baseline alone so the next good reading spans the whole gap.
    pub fn run(&mut self, token: &CancellationToken, sinks: &mut [&mut dyn Sink]) -> MonitorStats {
        let mut stats = MonitorStats::default();
        info!("MONITOR: sampling every {:?}", self.interval);

        while !token.is_cancelled() {
            self.clock.sleep(self.interval);
            if token.is_cancelled() {
                trace!("MONITOR: cancelled during sleep");
                break;
            }
            stats.ticks += 1;

            let energy_uj = match self.counter.read() {
                Ok(energy_uj) => energy_uj,
                Err(e) => {
                    warn!("Could not read energy value: {e}");
                    stats.read_failures += 1;
                    continue;
                }
            };
            let previous = self.estimator.baseline();

            let rate = self.estimator.update(energy_uj, self.clock.now());
            trace!("MONITOR: {energy_uj} µJ, {rate}");
            match rate {
                Rate::Watts(watts) => {
                    stats.reported += 1;
                    for sink in sinks.iter_mut() {
                        if let Err(e) = sink.record(watts) {
                            warn!("Failed to record reading: {e}");
                        }
                    }
                }
                Rate::Skipped(Skip::CounterReset) => {
                    stats.counter_resets += 1;
                    info!(
                        "Energy counter went backwards ({} -> {energy_uj} µJ), re-baselining",
                        previous.energy_uj
                    );
                }
                Rate::Skipped(Skip::ZeroInterval) => {
                    stats.zero_intervals += 1;
                }
            }
        }

        info!("MONITOR: stopped after {} ticks", stats.ticks);
        stats
    }
}
