use super::{Counters, MetricsSnapshot, UsageCounters};
use crate::policy::PolicyMix;
use serde::{Deserialize, Serialize};

/// Run summary consumed by the comparison harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub label: String,
    pub steps: usize,
    pub final_rbac_weight: f64,
    pub final_abac_weight: f64,
    pub final_breach_rate: f64,
    pub final_moving_avg_breach_rate: f64,
    pub mean_moving_avg_breach_rate: f64,
    pub peak_moving_avg_breach_rate: f64,
    pub access_attempts: u64,
    pub breach_count: u64,
    pub legit_grant_rate: f64,
}

pub fn analyze(
    snapshots: &[MetricsSnapshot],
    counters: Counters,
    usage: UsageCounters,
    final_mix: PolicyMix,
    label: &str,
) -> AnalysisReport {
    let n = snapshots.len();
    let moving: Vec<f64> = snapshots.iter().map(|s| s.moving_avg_breach_rate).collect();

    let mean = if n > 0 { moving.iter().sum::<f64>() / n as f64 } else { 0.0 };
    let peak = moving.iter().copied().fold(0.0, f64::max);

    let final_breach_rate = if counters.access_attempts > 0 {
        counters.breach_count as f64 / counters.access_attempts as f64
    } else {
        0.0
    };

    AnalysisReport {
        label: label.to_string(),
        steps: n,
        final_rbac_weight: final_mix.rbac_weight(),
        final_abac_weight: final_mix.abac_weight(),
        final_breach_rate,
        final_moving_avg_breach_rate: moving.last().copied().unwrap_or(0.0),
        mean_moving_avg_breach_rate: mean,
        peak_moving_avg_breach_rate: peak,
        access_attempts: counters.access_attempts,
        breach_count: counters.breach_count,
        legit_grant_rate: usage.grant_rate(),
    }
}

/// Field-wise mean over repetitions of the same scenario. `None` for no reports.
pub fn average_reports(reports: &[AnalysisReport]) -> Option<AnalysisReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;
    let mean = |f: fn(&AnalysisReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    Some(AnalysisReport {
        label: first.label.clone(),
        steps: first.steps,
        final_rbac_weight: mean(|r| r.final_rbac_weight),
        final_abac_weight: mean(|r| r.final_abac_weight),
        final_breach_rate: mean(|r| r.final_breach_rate),
        final_moving_avg_breach_rate: mean(|r| r.final_moving_avg_breach_rate),
        mean_moving_avg_breach_rate: mean(|r| r.mean_moving_avg_breach_rate),
        peak_moving_avg_breach_rate: reports
            .iter()
            .map(|r| r.peak_moving_avg_breach_rate)
            .fold(0.0, f64::max),
        access_attempts: (reports.iter().map(|r| r.access_attempts).sum::<u64>() as f64 / n) as u64,
        breach_count: (reports.iter().map(|r| r.breach_count).sum::<u64>() as f64 / n) as u64,
        legit_grant_rate: mean(|r| r.legit_grant_rate),
    })
}

/// Element-wise mean of equally indexed series; shorter series simply stop contributing.
pub fn mean_series(series: &[Vec<f64>]) -> Vec<f64> {
    let len = series.iter().map(Vec::len).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            let values: Vec<f64> = series.iter().filter_map(|s| s.get(i).copied()).collect();
            values.iter().sum::<f64>() / values.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(step: usize, ma: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            step,
            rbac_weight: 0.5,
            abac_weight: 0.5,
            moving_avg_breach_rate: ma,
            instantaneous_breach_rate: ma,
        }
    }

    #[test]
    fn test_analyze_summary() {
        let rows = vec![row(0, 0.0), row(1, 0.3), row(2, 0.2)];
        let counters = Counters { access_attempts: 10, breach_count: 2 };
        let report = analyze(&rows, counters, UsageCounters::default(), PolicyMix::BALANCED, "hybrid");
        assert_eq!(report.steps, 3);
        assert!((report.mean_moving_avg_breach_rate - 0.5 / 3.0).abs() < 1e-12);
        assert_eq!(report.peak_moving_avg_breach_rate, 0.3);
        assert_eq!(report.final_moving_avg_breach_rate, 0.2);
        assert_eq!(report.final_breach_rate, 0.2);
    }

    #[test]
    fn test_analyze_empty_run() {
        let report = analyze(&[], Counters::default(), UsageCounters::default(), PolicyMix::BALANCED, "empty");
        assert_eq!(report.steps, 0);
        assert_eq!(report.mean_moving_avg_breach_rate, 0.0);
        assert_eq!(report.final_breach_rate, 0.0);
    }

    #[test]
    fn test_average_reports() {
        assert!(average_reports(&[]).is_none());
        let a = analyze(&[row(0, 0.2)], Counters { access_attempts: 10, breach_count: 2 },
            UsageCounters::default(), PolicyMix::PURE_RBAC, "x");
        let b = analyze(&[row(0, 0.4)], Counters { access_attempts: 20, breach_count: 8 },
            UsageCounters::default(), PolicyMix::PURE_ABAC, "x");
        let avg = average_reports(&[a, b]).unwrap();
        assert!((avg.final_rbac_weight - 0.5).abs() < 1e-12);
        assert!((avg.final_moving_avg_breach_rate - 0.3).abs() < 1e-12);
        assert_eq!(avg.peak_moving_avg_breach_rate, 0.4);
        assert_eq!(avg.access_attempts, 15);
    }

    #[test]
    fn test_mean_series() {
        let mean = mean_series(&[vec![0.0, 1.0, 2.0], vec![1.0, 1.0]]);
        assert_eq!(mean, vec![0.5, 1.0, 2.0]);
    }
}
