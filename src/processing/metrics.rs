//! Per-pollutant summary statistics over a [`DailyMatrix`].

use crate::types::frames::daily_matrix::{DailyColumn, DailyMatrix};
use crate::types::stats::{Metrics, SeriesStats};
use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;

/// Fence multiplier of the interquartile-range outlier rule.
const IQR_FENCE: f64 = 1.5;

/// Minimum number of values needed for a trend estimate.
const MIN_TREND_POINTS: usize = 3;

/// Computes [`SeriesStats`] for every column of `matrix`, in column order.
///
/// Columns are independent of each other. The computation is pure: calling it
/// again on the same matrix yields identical results.
///
/// # Examples
///
/// ```
/// use aq_pipeline::{compute_metrics, DailyMatrix, Parameter};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let matrix = DailyMatrix::from_columns(
///     start,
///     vec![(Parameter::Pm25, vec![Some(10.0), None])],
/// )
/// .unwrap();
/// let stats = compute_metrics(&matrix);
/// let pm25 = stats.get(Parameter::Pm25).unwrap();
/// assert_eq!(pm25.coverage_pct, 50.0);
/// assert_eq!(pm25.mean, Some(10.0));
/// assert_eq!(pm25.trend_slope_per_day, None);
/// ```
pub fn compute_metrics(matrix: &DailyMatrix) -> Metrics {
    let mut metrics = Metrics::default();
    for column in matrix.columns() {
        metrics.push(column.parameter, column_stats(matrix.dates(), column));
    }
    metrics
}

fn column_stats(dates: &[NaiveDate], column: &DailyColumn) -> SeriesStats {
    let day_count = dates.len();
    let pairs: Vec<(NaiveDate, f64)> = dates
        .iter()
        .zip(column.values.iter())
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect();
    let mut sorted: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    sorted.sort_by_key(|v| OrderedFloat(*v));

    let coverage_pct = if day_count == 0 {
        0.0
    } else {
        round_to(100.0 * sorted.len() as f64 / day_count as f64, 1)
    };

    SeriesStats {
        day_count,
        coverage_pct,
        mean: mean(&sorted),
        max: sorted.last().copied(),
        p95: quantile(&sorted, 0.95),
        trend_slope_per_day: trend_slope(&pairs),
        anomaly_count: iqr_anomaly_count(&sorted),
    }
}

/// Rounds half to even, so 6.25 becomes 6.2.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile of ascending `sorted` values, interpolating linearly between the
/// two closest ranks.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Ordinary-least-squares slope of value against day ordinal.
fn trend_slope(pairs: &[(NaiveDate, f64)]) -> Option<f64> {
    if pairs.len() < MIN_TREND_POINTS {
        return None;
    }
    let n = pairs.len() as f64;
    let xs: Vec<f64> = pairs
        .iter()
        .map(|(d, _)| f64::from(d.num_days_from_ce()))
        .collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = pairs.iter().map(|(_, v)| v).sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, (_, y)) in xs.iter().zip(pairs) {
        covariance += (x - x_mean) * (y - y_mean);
        variance += (x - x_mean) * (x - x_mean);
    }
    if variance == 0.0 {
        return None;
    }
    Some(covariance / variance)
}

/// Counts values strictly outside `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]`.
fn iqr_anomaly_count(sorted: &[f64]) -> usize {
    let (Some(q1), Some(q3)) = (quantile(sorted, 0.25), quantile(sorted, 0.75)) else {
        return 0;
    };
    let iqr = q3 - q1;
    let low = q1 - IQR_FENCE * iqr;
    let high = q3 + IQR_FENCE * iqr;
    sorted.iter().filter(|v| **v < low || **v > high).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parameter::Parameter;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn single(values: Vec<Option<f64>>) -> SeriesStats {
        let matrix = DailyMatrix::from_columns(start(), vec![(Parameter::Pm25, values)]).unwrap();
        compute_metrics(&matrix)
            .get(Parameter::Pm25)
            .cloned()
            .unwrap()
    }

    fn present(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn test_compute_metrics_basic() {
        let matrix = DailyMatrix::from_columns(
            start(),
            vec![
                (
                    Parameter::Pm25,
                    present(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 11.0, 13.0, 12.0, 15.0]),
                ),
                (
                    Parameter::Pm10,
                    present(&[20.0, 18.0, 19.0, 21.0, 22.0, 20.0, 19.0, 22.0, 21.0, 23.0]),
                ),
            ],
        )
        .unwrap();
        let metrics = compute_metrics(&matrix);
        let order: Vec<Parameter> = metrics.iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![Parameter::Pm25, Parameter::Pm10]);

        let pm25 = metrics.get(Parameter::Pm25).unwrap();
        assert_eq!(pm25.day_count, 10);
        assert_eq!(pm25.coverage_pct, 100.0);
        assert!((pm25.mean.unwrap() - 12.3).abs() < 1e-9);
        assert_eq!(pm25.max, Some(15.0));
        assert!(pm25.trend_slope_per_day.unwrap() > 0.0);
    }

    #[test]
    fn test_all_missing_column() {
        let stats = single(vec![None; 4]);
        assert_eq!(stats.day_count, 4);
        assert_eq!(stats.coverage_pct, 0.0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.max, None);
        assert_eq!(stats.p95, None);
        assert_eq!(stats.trend_slope_per_day, None);
        assert_eq!(stats.anomaly_count, 0);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = DailyMatrix::empty(&[Parameter::Pm10]);
        let stats = compute_metrics(&matrix);
        let pm10 = stats.get(Parameter::Pm10).unwrap();
        assert_eq!(pm10.day_count, 0);
        assert_eq!(pm10.coverage_pct, 0.0);
        assert_eq!(pm10.mean, None);
    }

    #[test]
    fn test_coverage_rounding() {
        let stats = single(vec![Some(1.0), None, None]);
        assert_eq!(stats.coverage_pct, 33.3);
        let stats = single(vec![Some(1.0), Some(1.0), None]);
        assert_eq!(stats.coverage_pct, 66.7);

        let mut one_of_sixteen = vec![None; 16];
        one_of_sixteen[3] = Some(4.0);
        assert_eq!(single(one_of_sixteen).coverage_pct, 6.2);
        let mut three_of_eight = vec![None; 8];
        three_of_eight[..3].fill(Some(1.0));
        assert_eq!(single(three_of_eight).coverage_pct, 37.5);
    }

    #[test]
    fn test_trend_sign() {
        let rising: Vec<f64> = (1..=10).map(f64::from).collect();
        let slope = single(present(&rising)).trend_slope_per_day.unwrap();
        assert!((slope - 1.0).abs() < 1e-9);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert!(single(present(&falling)).trend_slope_per_day.unwrap() < 0.0);

        let flat = single(present(&[7.0; 6])).trend_slope_per_day.unwrap();
        assert!(flat.abs() < 1e-12);
    }

    #[test]
    fn test_trend_uses_calendar_spacing() {
        // the gap day still counts on the x axis
        let stats = single(vec![Some(0.0), Some(1.0), None, Some(3.0)]);
        assert!((stats.trend_slope_per_day.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(single(vec![Some(1.0), None, Some(2.0)]).trend_slope_per_day, None);
    }

    #[test]
    fn test_iqr_anomaly_count() {
        let stats = single(present(&[10.0, 10.0, 10.0, 10.0, 10.0, 100.0]));
        assert_eq!(stats.anomaly_count, 1);
        let stats = single(present(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(stats.anomaly_count, 0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted: Vec<f64> = (1..=5).map(f64::from).collect();
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.5), Some(3.0));
        assert_eq!(quantile(&sorted, 0.25), Some(2.0));
        assert!((quantile(&sorted, 0.95).unwrap() - 4.8).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[42.0], 0.95), Some(42.0));
    }

    #[test]
    fn test_compute_metrics_is_idempotent() {
        let matrix = DailyMatrix::from_columns(
            start(),
            vec![
                (Parameter::Pm25, vec![Some(3.5), None, Some(9.25), Some(1.0)]),
                (Parameter::CarbonMonoxide, vec![None, Some(210.0), None, None]),
            ],
        )
        .unwrap();
        let first = compute_metrics(&matrix);
        let second = compute_metrics(&matrix);
        assert_eq!(first, second);
        assert_eq!(
            matrix.column(Parameter::Pm25).unwrap().values,
            vec![Some(3.5), None, Some(9.25), Some(1.0)]
        );
    }
}
