//! Resamples a raw observation stream into a [`DailyMatrix`].

use crate::types::frames::daily_matrix::DailyMatrix;
use crate::types::frames::raw_series::RawSeries;
use crate::types::parameter::Parameter;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// What a reduction did, for the caller to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReduceSummary {
    /// Observations in the raw input.
    pub input_rows: usize,
    /// Observations dropped for lacking a value.
    pub dropped_missing: usize,
    /// Rows in the produced matrix.
    pub days: usize,
    /// Cells filled by interior interpolation.
    pub interpolated: usize,
}

/// Reduces hourly observations to one mean per UTC calendar day and pollutant.
///
/// See [`reduce_with_summary`].
pub fn reduce(raw: &RawSeries, interpolate: bool) -> DailyMatrix {
    reduce_with_summary(raw, interpolate).0
}

/// Reduces hourly observations to one mean per UTC calendar day and pollutant,
/// also returning a [`ReduceSummary`].
///
/// Observations without a value are dropped before averaging. The matrix index
/// runs from the earliest to the latest day of the raw series, so a day whose
/// slots were all reported without a value is still a row; such days are gaps,
/// never zeros. With `interpolate`, gaps with a known value on both sides are
/// filled linearly and leading or trailing gaps stay missing.
///
/// Each column's unit is the most frequent non-empty unit observed for that
/// pollutant (the earliest seen wins a tie), or empty.
///
/// An input without usable rows yields an empty matrix that still carries
/// every column of the raw series.
pub fn reduce_with_summary(raw: &RawSeries, interpolate: bool) -> (DailyMatrix, ReduceSummary) {
    let mut sums: HashMap<Parameter, BTreeMap<NaiveDate, (f64, usize)>> = HashMap::new();
    let mut units: HashMap<Parameter, UnitTally> = HashMap::new();
    let mut dropped_missing = 0;

    for observation in raw.observations() {
        let Some(value) = observation.value.filter(|v| v.is_finite()) else {
            dropped_missing += 1;
            continue;
        };
        let cell = sums
            .entry(observation.parameter)
            .or_default()
            .entry(observation.day())
            .or_insert((0.0, 0));
        cell.0 += value;
        cell.1 += 1;
        if let Some(unit) = observation.unit.as_deref() {
            units.entry(observation.parameter).or_default().add(unit);
        }
    }

    let columns = raw
        .parameters()
        .iter()
        .map(|parameter| {
            let means: BTreeMap<NaiveDate, f64> = sums
                .remove(parameter)
                .unwrap_or_default()
                .into_iter()
                .map(|(day, (sum, count))| (day, sum / count as f64))
                .collect();
            let unit = units
                .get(parameter)
                .and_then(UnitTally::most_frequent)
                .unwrap_or_default();
            (*parameter, unit, means)
        })
        .collect();

    let span = raw.time_bounds().map(|(first, last)| (first.date(), last.date()));
    let mut matrix = DailyMatrix::from_sparse(columns, span);
    let before = count_present(&matrix);
    if interpolate {
        matrix.fill_interior_gaps();
    }
    let summary = ReduceSummary {
        input_rows: raw.len(),
        dropped_missing,
        days: matrix.len(),
        interpolated: count_present(&matrix) - before,
    };
    (matrix, summary)
}

fn count_present(matrix: &DailyMatrix) -> usize {
    matrix.columns().iter().map(|c| c.present_count()).sum()
}

#[derive(Debug, Default)]
struct UnitTally {
    counts: Vec<(String, usize)>,
}

impl UnitTally {
    fn add(&mut self, unit: &str) {
        let unit = unit.trim();
        if unit.is_empty() {
            return;
        }
        match self.counts.iter_mut().find(|(u, _)| u == unit) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((unit.to_string(), 1)),
        }
    }

    fn most_frequent(&self) -> Option<String> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(u, _)| u.clone())
    }
}

/// Linearly fills runs of `None` that have a known value on both sides.
/// Leading and trailing runs are left untouched.
pub fn interpolate_interior(values: &mut [Option<f64>]) {
    let mut last_known: Option<(usize, f64)> = None;
    for i in 0..values.len() {
        let Some(current) = values[i] else {
            continue;
        };
        if let Some((j, previous)) = last_known {
            let span = (i - j) as f64;
            for (k, slot) in values.iter_mut().enumerate().take(i).skip(j + 1) {
                *slot = Some(previous + (current - previous) * (k - j) as f64 / span);
            }
        }
        last_known = Some((i, current));
    }
}
