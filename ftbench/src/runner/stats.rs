use std::{fmt::Display, time::Duration};

use hdrhistogram::Histogram;

use crate::runner::RunError;

const MAX_LATENCY_MICROS: u64 = 60 * 60 * 1_000_000;

/// Iteration outcomes of a single virtual user, merged into the run total at the end.
#[derive(Debug, Clone)]
pub struct Stats {
    iterations: u64,
    failures: u64,
    latencies: Histogram<u64>,
}

impl Stats {
    pub fn new() -> Result<Self, RunError> {
        Ok(Self {
            iterations: 0,
            failures: 0,
            latencies: Histogram::new_with_bounds(1, MAX_LATENCY_MICROS, 3)?,
        })
    }

    pub fn record(&mut self, latency: Duration, succeeded: bool) {
        self.iterations += 1;
        if !succeeded {
            self.failures += 1;
        }

        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latencies.saturating_record(micros);
    }

    pub fn merge(&mut self, other: &Self) -> Result<(), RunError> {
        self.iterations += other.iterations;
        self.failures += other.failures;
        self.latencies.add(&other.latencies)?;

        Ok(())
    }

    #[must_use]
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    /// `quantile` is between 0 and 1. Zero when nothing was recorded.
    #[must_use]
    pub fn latency_at(&self, quantile: f64) -> Duration {
        Duration::from_micros(self.latencies.value_at_quantile(quantile))
    }

    #[must_use]
    pub fn max_latency(&self) -> Duration {
        Duration::from_micros(self.latencies.max())
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: Stats,
    /// How long the profile ran, without the graceful stop that follows it.
    pub elapsed: Duration,
    pub peak_users: usize,
    /// Users that were still busy when the graceful stop ran out. Their iterations are lost.
    pub aborted_users: usize,
}

impl RunReport {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }

        self.stats.iterations() as f64 / self.elapsed.as_secs_f64()
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "iterations: {} ({} failed) in {:.1?}, {:.1}/s, peak users: {}, aborted users: {}",
            self.stats.iterations(),
            self.stats.failures(),
            self.elapsed,
            self.throughput(),
            self.peak_users,
            self.aborted_users,
        )?;
        write!(
            f,
            "latency p50: {:?}, p90: {:?}, p99: {:?}, max: {:?}",
            self.stats.latency_at(0.5),
            self.stats.latency_at(0.9),
            self.stats.latency_at(0.99),
            self.stats.max_latency(),
        )
    }
}
