//! Plain-text summary of a city's daily metrics.

use crate::processing::metrics::compute_metrics;
use crate::types::frames::daily_matrix::DailyMatrix;
use crate::types::stats::Metrics;
use chrono::NaiveDate;
use std::fmt;

pub const REPORT_HEADER: &str = "name | coverage% | mean | max | p95 | trend(unit/day) | anomalies";
const REPORT_DIVIDER: &str = "-----|-----------|------|-----|-----|-------------------|----------";

/// Everything the text report shows for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub city: Option<String>,
    /// First and last day of the matrix, `None` for an empty matrix.
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub metrics: Metrics,
}

impl SummaryReport {
    pub fn new(city: Option<String>, range: Option<(NaiveDate, NaiveDate)>, metrics: Metrics) -> Self {
        Self {
            city,
            range,
            metrics,
        }
    }

    /// Computes the metrics of `matrix` and takes its date bounds as range.
    pub fn from_matrix(city: Option<&str>, matrix: &DailyMatrix) -> Self {
        Self::new(
            city.map(str::to_string),
            matrix.date_bounds(),
            compute_metrics(matrix),
        )
    }

    /// Renders the report. Same as the `Display` output.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "nan".to_string(),
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(city) = &self.city {
            writeln!(f, "City: {city}")?;
        }
        match self.range {
            Some((first, last)) => writeln!(f, "Range: {first} – {last}")?,
            None => writeln!(f, "Range: [no data]")?,
        }
        writeln!(f)?;
        writeln!(f, "Pollutant Summary (daily):")?;
        writeln!(f, "{REPORT_HEADER}")?;
        writeln!(f, "{REPORT_DIVIDER}")?;
        for (parameter, stats) in self.metrics.iter() {
            writeln!(
                f,
                "{} | {:.1} | {} | {} | {} | {} | {}",
                parameter,
                stats.coverage_pct,
                fmt_opt(stats.mean, 2),
                fmt_opt(stats.max, 2),
                fmt_opt(stats.p95, 2),
                fmt_opt(stats.trend_slope_per_day, 3),
                stats.anomaly_count,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parameter::Parameter;

    #[test]
    fn test_report_layout() -> Result<(), Box<dyn std::error::Error>> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let matrix = DailyMatrix::from_columns(
            start,
            vec![
                (Parameter::Pm25, vec![Some(10.0), Some(12.0), Some(14.0), None]),
                (Parameter::NitrogenDioxide, vec![None; 4]),
            ],
        )?;
        let text = SummaryReport::from_matrix(Some("Milan"), &matrix).render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "City: Milan");
        assert_eq!(lines[1], "Range: 2024-01-01 – 2024-01-04");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Pollutant Summary (daily):");
        assert_eq!(lines[4], REPORT_HEADER);
        assert_eq!(lines[6], "pm2_5 | 75.0 | 12.00 | 14.00 | 13.80 | 2.000 | 0");
        assert_eq!(lines[7], "nitrogen_dioxide | 0.0 | nan | nan | nan | nan | 0");
        assert_eq!(lines.len(), 8);
        Ok(())
    }

    #[test]
    fn test_report_without_city_or_data() {
        let matrix = DailyMatrix::empty(&[Parameter::Pm10]);
        let text = SummaryReport::from_matrix(None, &matrix).render();
        assert!(text.starts_with("Range: [no data]\n\n"));
        assert!(text.ends_with("pm10 | 0.0 | nan | nan | nan | nan | 0\n"));
    }
}
