//! Exponentially-smoothed RTT/jitter tracking over a bounded recent
//! history (§3, §4.2), following the RFC 6298-style update law.

use crate::clock::MonotonicInstant;
use std::collections::VecDeque;

/// Smoothing constant applied to the mean.
pub const ALPHA: f64 = 0.125;
/// Smoothing constant applied to the mean absolute deviation.
pub const BETA: f64 = 0.25;

/// Tracks a smoothed mean and mean-absolute-deviation of RTT samples,
/// plus a bounded window of the most recent raw samples in milliseconds.
#[derive(Debug, Clone)]
pub struct RttMonitor {
    capacity: usize,
    samples: VecDeque<f64>,
    mean: Option<f64>,
    deviation: Option<f64>,
    time_last_observed: Option<MonotonicInstant>,
}

impl RttMonitor {
    /// Create a monitor retaining at most `capacity` recent samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            mean: None,
            deviation: None,
            time_last_observed: None,
        }
    }

    /// Record a new RTT sample `rtt_ms`, in milliseconds.
    ///
    /// Synchronous and non-failing. The first observation sets
    /// `mean = rtt_ms` and `deviation = 0`; subsequent observations
    /// apply the smoothing update law.
    pub fn observe(&mut self, rtt_ms: f64) {
        self.mean = Some(match self.mean {
            None => rtt_ms,
            Some(mean) => (1.0 - ALPHA) * mean + ALPHA * rtt_ms,
        });
        let mean = self.mean.expect("just set above");
        let deviation = (mean - rtt_ms).abs();
        self.deviation = Some(match self.deviation {
            None => deviation,
            Some(prev) => (1.0 - BETA) * prev + BETA * deviation,
        });
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
        self.time_last_observed = Some(MonotonicInstant::now());
    }

    /// The smoothed mean RTT in milliseconds, or `None` before the
    /// first observation.
    #[must_use]
    pub fn mean_ms(&self) -> Option<f64> {
        self.mean
    }

    /// The smoothed mean absolute deviation in milliseconds, or `None`
    /// before the first observation.
    #[must_use]
    pub fn deviation_ms(&self) -> Option<f64> {
        self.deviation
    }

    /// The most recent samples, oldest first, newest last.
    #[must_use]
    pub fn recent_samples_ms(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// When `observe` was last called, or `None` if it never has been.
    #[must_use]
    pub fn time_last_observed(&self) -> Option<MonotonicInstant> {
        self.time_last_observed
    }
}

impl Default for RttMonitor {
    fn default() -> Self {
        Self::new(100)
    }
}
