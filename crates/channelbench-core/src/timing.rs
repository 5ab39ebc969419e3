use std::time::{Duration, Instant};

use tracing::debug;

/// Ordered wall-clock durations, one per iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencySeries {
    samples: Vec<Duration>,
}

impl LatencySeries {
    pub fn from_durations(samples: Vec<Duration>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn durations(&self) -> &[Duration] {
        &self.samples
    }

    /// Samples in seconds, in iteration order.
    pub fn seconds(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(Duration::as_secs_f64)
    }

    /// Arithmetic mean in seconds; `None` for an empty series.
    pub fn mean_seconds(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.seconds().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn max_seconds(&self) -> Option<f64> {
        self.seconds().reduce(f64::max)
    }
}

/// Runs a round trip a fixed number of times, one after another.
///
/// Each iteration is bracketed by two monotonic timestamps; only the span
/// between them is recorded. The first error ends the run and the samples
/// collected so far are dropped with it.
#[derive(Clone, Copy, Debug)]
pub struct TimingLoop {
    iterations: usize,
}

impl TimingLoop {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn run<F, E>(&self, mut round_trip: F) -> Result<LatencySeries, E>
    where
        F: FnMut(usize) -> Result<(), E>,
    {
        let mut samples = Vec::with_capacity(self.iterations);
        for iteration in 0..self.iterations {
            let start = Instant::now();
            round_trip(iteration)?;
            let end = Instant::now();

            let elapsed = end.duration_since(start);
            samples.push(elapsed);
            debug!(
                iteration,
                elapsed_us = elapsed.as_micros() as u64,
                "iteration complete"
            );
        }
        Ok(LatencySeries { samples })
    }
}
