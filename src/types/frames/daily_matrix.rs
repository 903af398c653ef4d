//! Contains the [`DailyMatrix`], the canonical processed artifact: one row per
//! calendar day, one column per pollutant.

use crate::processing::aqi::combined_pm_aqi;
use crate::processing::reduce::interpolate_interior;
use crate::types::error::SeriesError;
use crate::types::parameter::Parameter;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

const DATE_COLUMN: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily mean concentrations of one pollutant, aligned with [`DailyMatrix::dates`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailyColumn {
    pub parameter: Parameter,
    /// Most frequent unit seen in the raw input, empty if unknown.
    pub unit: String,
    /// `None` marks a day without a value; it is never conflated with zero.
    pub values: Vec<Option<f64>>,
}

impl DailyColumn {
    /// Number of days holding a value.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// A table indexed by a contiguous, ascending range of calendar days.
///
/// Every day between the first and the last is present, even when no pollutant
/// has a value for it. Columns appear in the order of the parameter list the
/// matrix was built from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyMatrix {
    dates: Vec<NaiveDate>,
    columns: Vec<DailyColumn>,
}

impl DailyMatrix {
    /// An empty matrix (zero rows) that still carries every column.
    pub fn empty(parameters: &[Parameter]) -> Self {
        Self {
            dates: Vec::new(),
            columns: distinct(parameters)
                .into_iter()
                .map(|parameter| DailyColumn {
                    parameter,
                    unit: String::new(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Builds a matrix whose first row is `start`, from columns of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::ColumnLength`] if the columns differ in length.
    ///
    /// # Examples
    ///
    /// ```
    /// use aq_pipeline::{DailyMatrix, Parameter};
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let matrix = DailyMatrix::from_columns(
    ///     start,
    ///     vec![(Parameter::Pm25, vec![Some(5.0), None, Some(7.5)])],
    /// )
    /// .unwrap();
    /// assert_eq!(matrix.len(), 3);
    /// assert_eq!(matrix.date_bounds().unwrap().1, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    /// ```
    pub fn from_columns(
        start: NaiveDate,
        columns: Vec<(Parameter, Vec<Option<f64>>)>,
    ) -> Result<Self, SeriesError> {
        let len = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((parameter, values)) = columns.iter().find(|(_, v)| v.len() != len) {
            return Err(SeriesError::ColumnLength {
                column: parameter.canonical_name().to_string(),
                expected: len,
                found: values.len(),
            });
        }
        Ok(Self {
            dates: start.iter_days().take(len).collect(),
            columns: columns
                .into_iter()
                .map(|(parameter, values)| DailyColumn {
                    parameter,
                    unit: String::new(),
                    values,
                })
                .collect(),
        })
    }

    /// Reindexes sparse per-parameter daily values onto one shared contiguous
    /// calendar.
    ///
    /// The calendar spans every parameter's earliest to latest day, widened to
    /// `span` when given. Without any value the matrix has no rows.
    pub(crate) fn from_sparse(
        columns: Vec<(Parameter, String, BTreeMap<NaiveDate, f64>)>,
        span: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        let first = columns
            .iter()
            .filter_map(|(_, _, m)| m.keys().next().copied())
            .min();
        let last = columns
            .iter()
            .filter_map(|(_, _, m)| m.keys().next_back().copied())
            .max();
        let dates = match (first, last, span) {
            (Some(first), Some(last), Some((lo, hi))) => contiguous_days(first.min(lo), last.max(hi)),
            (Some(first), Some(last), None) => contiguous_days(first, last),
            _ => Vec::new(),
        };
        let columns = columns
            .into_iter()
            .map(|(parameter, unit, cells)| DailyColumn {
                parameter,
                unit,
                values: dates.iter().map(|d| cells.get(d).copied()).collect(),
            })
            .collect();
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[DailyColumn] {
        &self.columns
    }

    pub fn column(&self, parameter: Parameter) -> Option<&DailyColumn> {
        self.columns.iter().find(|c| c.parameter == parameter)
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        self.columns.iter().map(|c| c.parameter).collect()
    }

    /// Number of calendar days (rows), including days without any value.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last day of the index.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// The value of `parameter` on `date`, `None` if absent or outside the index.
    pub fn value(&self, parameter: Parameter, date: NaiveDate) -> Option<f64> {
        let first = *self.dates.first()?;
        let offset = usize::try_from((date - first).num_days()).ok()?;
        self.column(parameter)?.values.get(offset).copied().flatten()
    }

    /// Fills runs of missing days that have a known value on both sides, by
    /// linear interpolation. Leading and trailing gaps stay missing.
    pub fn fill_interior_gaps(&mut self) {
        for column in &mut self.columns {
            interpolate_interior(&mut column.values);
        }
    }

    /// Daily PM-based air-quality index: the worse of the PM2.5 and PM10 indices,
    /// `None` on days where neither is available or in range.
    pub fn pm_aqi(&self) -> Vec<Option<f64>> {
        let pm25 = self.column(Parameter::Pm25);
        let pm10 = self.column(Parameter::Pm10);
        (0..self.len())
            .map(|i| {
                let at = |c: Option<&DailyColumn>| c.and_then(|c| c.values[i]);
                combined_pm_aqi(at(pm25), at(pm10))
            })
            .collect()
    }

    /// Converts the matrix into a table with a `date` column followed by one
    /// column per pollutant, headed by its canonical name.
    pub fn to_dataframe(&self) -> Result<DataFrame, SeriesError> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        let dates: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        columns.push(Column::new(DATE_COLUMN.into(), dates));
        for column in &self.columns {
            columns.push(Column::new(
                column.parameter.canonical_name().into(),
                column.values.clone(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Reads a table produced by [`DailyMatrix::to_dataframe`].
    ///
    /// Rows are sorted by date and the index is re-expanded to a contiguous
    /// range. Units are not part of the table and come back empty.
    ///
    /// # Errors
    ///
    /// * [`SeriesError::MissingColumns`] if there is no `date` column.
    /// * [`SeriesError::UnknownColumn`] for a header that is not a canonical pollutant name.
    /// * [`SeriesError::InvalidDate`] for a date cell that is not `YYYY-MM-DD`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, SeriesError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.as_str().to_string())
            .collect();
        if !names.iter().any(|n| n == DATE_COLUMN) {
            return Err(SeriesError::MissingColumns {
                missing: vec![DATE_COLUMN.to_string()],
            });
        }

        let mut parameters = Vec::new();
        for name in names.iter().filter(|n| *n != DATE_COLUMN) {
            let parameter = Parameter::from_canonical(name)
                .ok_or_else(|| SeriesError::UnknownColumn(name.clone()))?;
            parameters.push((name.as_str(), parameter));
        }

        let date_col = df.column(DATE_COLUMN)?.cast(&DataType::String)?;
        let mut dates = Vec::with_capacity(df.height());
        for cell in date_col.str()?.into_iter() {
            let raw = cell.unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map_err(|_| SeriesError::InvalidDate(raw.to_string()))?;
            dates.push(date);
        }

        let index = match (dates.iter().min(), dates.iter().max()) {
            (Some(first), Some(last)) => contiguous_days(*first, *last),
            _ => Vec::new(),
        };
        let mut columns = Vec::with_capacity(parameters.len());
        for (name, parameter) in parameters {
            let values_col = df.column(name)?.cast(&DataType::Float64)?;
            let cells: BTreeMap<NaiveDate, f64> = dates
                .iter()
                .zip(values_col.f64()?.into_iter())
                .filter_map(|(d, v)| v.filter(|v| !v.is_nan()).map(|v| (*d, v)))
                .collect();
            columns.push(DailyColumn {
                parameter,
                unit: String::new(),
                values: index.iter().map(|d| cells.get(d).copied()).collect(),
            });
        }
        Ok(Self {
            dates: index,
            columns,
        })
    }
}

fn contiguous_days(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    first.iter_days().take_while(|d| *d <= last).collect()
}

fn distinct(parameters: &[Parameter]) -> Vec<Parameter> {
    let mut out = Vec::with_capacity(parameters.len());
    for p in parameters {
        if !out.contains(p) {
            out.push(*p);
        }
    }
    out
}
