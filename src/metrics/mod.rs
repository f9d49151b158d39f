pub mod logger;
pub mod analyzer;

use crate::policy::PolicyMix;
use serde::{Deserialize, Serialize};

/// One time-series row, recorded at the end of each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub step: usize,
    pub rbac_weight: f64,
    pub abac_weight: f64,
    pub moving_avg_breach_rate: f64,
    pub instantaneous_breach_rate: f64,
}

/// Raw attack counters; `breach_count <= access_attempts` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub access_attempts: u64,
    pub breach_count: u64,
}

/// Legitimate employee traffic, tracked apart from attack counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub legit_requests: u64,
    pub legit_granted: u64,
}

impl UsageCounters {
    pub fn grant_rate(&self) -> f64 {
        if self.legit_requests > 0 {
            self.legit_granted as f64 / self.legit_requests as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    counters: Counters,
    usage: UsageCounters,
    breach_history: Vec<f64>,
    moving_window: usize,
    snapshots: Vec<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new(moving_window: usize) -> Self {
        Self {
            counters: Counters::default(),
            usage: UsageCounters::default(),
            breach_history: Vec::new(),
            moving_window: moving_window.max(1),
            snapshots: Vec::new(),
        }
    }

    pub fn record_attempt(&mut self, breached: bool) {
        self.counters.access_attempts += 1;
        if breached {
            self.counters.breach_count += 1;
        }
    }

    pub fn record_legit_request(&mut self, granted: bool) {
        self.usage.legit_requests += 1;
        if granted {
            self.usage.legit_granted += 1;
        }
    }

    /// Breaches over attempts. Zero attempts reads as a rate of 0.
    pub fn instantaneous_rate(&self) -> f64 {
        if self.counters.access_attempts > 0 {
            self.counters.breach_count as f64 / self.counters.access_attempts as f64
        } else {
            0.0
        }
    }

    /// Mean of the last `min(window, len)` samples, 0 for an empty history.
    pub fn moving_average(&self, window: usize) -> f64 {
        let len = self.breach_history.len();
        let take = window.min(len);
        if take == 0 {
            return 0.0;
        }
        let tail = &self.breach_history[len - take..];
        tail.iter().sum::<f64>() / take as f64
    }

    /// Moving average over the configured window.
    pub fn moving_breach_rate(&self) -> f64 {
        self.moving_average(self.moving_window)
    }

    /// Appends the current instantaneous rate to the breach history.
    pub fn sample_rate(&mut self) -> f64 {
        let rate = self.instantaneous_rate();
        self.breach_history.push(rate);
        rate
    }

    pub fn save_snapshot(&mut self, step: usize, mix: PolicyMix) {
        let snapshot = MetricsSnapshot {
            step,
            rbac_weight: mix.rbac_weight(),
            abac_weight: mix.abac_weight(),
            moving_avg_breach_rate: self.moving_breach_rate(),
            instantaneous_breach_rate: self.instantaneous_rate(),
        };
        self.snapshots.push(snapshot);
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn usage(&self) -> UsageCounters {
        self.usage
    }

    pub fn breach_history(&self) -> &[f64] {
        &self.breach_history
    }

    pub fn moving_window(&self) -> usize {
        self.moving_window
    }

    pub fn snapshots(&self) -> &[MetricsSnapshot] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_rate_is_zero() {
        let metrics = MetricsRecorder::new(10);
        assert_eq!(metrics.instantaneous_rate(), 0.0);
        assert_eq!(metrics.moving_breach_rate(), 0.0);
    }

    #[test]
    fn test_moving_average_reads_suffix() {
        let mut metrics = MetricsRecorder::new(2);
        metrics.breach_history = vec![1.0, 0.2, 0.4];
        assert!((metrics.moving_breach_rate() - 0.3).abs() < 1e-12);
        assert!((metrics.moving_average(10) - 0.5333333333333333).abs() < 1e-12);
        assert_eq!(metrics.moving_average(0), 0.0);
    }

    #[test]
    fn test_all_zero_history() {
        let mut metrics = MetricsRecorder::new(10);
        for _ in 0..25 {
            metrics.sample_rate();
        }
        assert_eq!(metrics.breach_history().len(), 25);
        assert_eq!(metrics.moving_average(7), 0.0);
    }

    #[test]
    fn test_counters_and_snapshot() {
        let mut metrics = MetricsRecorder::new(10);
        metrics.record_attempt(true);
        metrics.record_attempt(false);
        metrics.record_attempt(false);
        metrics.record_attempt(true);
        assert_eq!(metrics.counters(), Counters { access_attempts: 4, breach_count: 2 });
        assert_eq!(metrics.sample_rate(), 0.5);

        metrics.save_snapshot(0, PolicyMix::BALANCED);
        let row = &metrics.snapshots()[0];
        assert_eq!(row.moving_avg_breach_rate, 0.5);
        assert_eq!(row.rbac_weight, 0.5);
    }

    #[test]
    fn test_usage_grant_rate() {
        let mut metrics = MetricsRecorder::new(10);
        assert_eq!(metrics.usage().grant_rate(), 0.0);
        metrics.record_legit_request(true);
        metrics.record_legit_request(false);
        assert_eq!(metrics.usage().grant_rate(), 0.5);
    }
}
