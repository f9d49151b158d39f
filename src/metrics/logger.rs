use super::MetricsSnapshot;
use crate::error::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

/// CSV sink for time-series rows, one row per simulation step.
pub struct MetricsLogger {
    writer: Writer<File>,
}

impl MetricsLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, snapshot: &MetricsSnapshot) -> Result<()> {
        self.writer.serialize(snapshot)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_batch(&mut self, snapshots: &[MetricsSnapshot]) -> Result<()> {
        for snapshot in snapshots {
            self.writer.serialize(snapshot)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes per-step series side by side, one column per label.
/// Shorter series leave their trailing cells empty.
pub fn write_overlay(path: impl AsRef<Path>, labels: &[String], series: &[Vec<f64>]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["step".to_string()];
    header.extend(labels.iter().cloned());
    writer.write_record(&header)?;

    let len = series.iter().map(Vec::len).max().unwrap_or(0);
    for step in 0..len {
        let mut row = vec![step.to_string()];
        row.extend(
            series
                .iter()
                .map(|s| s.get(step).map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_batch_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let rows = vec![
            MetricsSnapshot {
                step: 0,
                rbac_weight: 0.5,
                abac_weight: 0.5,
                moving_avg_breach_rate: 0.0,
                instantaneous_breach_rate: 0.0,
            },
            MetricsSnapshot {
                step: 1,
                rbac_weight: 0.6,
                abac_weight: 0.4,
                moving_avg_breach_rate: 0.1,
                instantaneous_breach_rate: 0.2,
            },
        ];

        let mut logger = MetricsLogger::new(&path).unwrap();
        logger.log(&rows[0]).unwrap();
        logger.log_batch(&rows[1..]).unwrap();
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("step,rbac_weight,abac_weight,moving_avg_breach_rate,instantaneous_breach_rate")
        );
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_overlay_pads_short_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.csv");
        write_overlay(
            &path,
            &["hybrid".to_string(), "pure-abac".to_string()],
            &[vec![0.1, 0.2], vec![0.3]],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "step,hybrid,pure-abac");
        assert_eq!(lines[1], "0,0.100000,0.300000");
        assert_eq!(lines[2], "1,0.200000,");
    }
}
