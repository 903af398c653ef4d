use crate::types::parameter::Parameter;
use serde::Serialize;

/// Summary statistics of one pollutant column of a [`crate::DailyMatrix`].
///
/// Fields that cannot be computed from the available values are `None`,
/// never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Rows in the matrix, missing days included.
    pub day_count: usize,
    /// Share of days holding a value, in percent, rounded to one decimal.
    pub coverage_pct: f64,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    /// 95th percentile, linearly interpolated between ranks.
    pub p95: Option<f64>,
    /// Least-squares slope in concentration units per calendar day.
    pub trend_slope_per_day: Option<f64>,
    /// Values outside the 1.5 × IQR fences.
    pub anomaly_count: usize,
}

/// Per-pollutant statistics in the column order of the matrix they came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Metrics {
    entries: Vec<(Parameter, SeriesStats)>,
}

impl Metrics {
    pub(crate) fn push(&mut self, parameter: Parameter, stats: SeriesStats) {
        self.entries.push((parameter, stats));
    }

    pub fn get(&self, parameter: Parameter) -> Option<&SeriesStats> {
        self.entries
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &SeriesStats)> {
        self.entries.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
