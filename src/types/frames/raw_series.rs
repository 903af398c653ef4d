//! Contains the [`RawSeries`] structure holding irregular hourly observations as
//! delivered by an [`crate::ObservationSource`].

use crate::types::dates::AnyTimestamp;
use crate::types::error::SeriesError;
use crate::types::parameter::Parameter;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

const TIMESTAMP_COLUMNS: [&str; 2] = ["time", "date"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One reading of one pollutant at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Timezone-naive instant, normalised to UTC.
    pub time: NaiveDateTime,
    pub parameter: Parameter,
    /// `None` when the source reported the slot without a value.
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Observation {
    pub fn new(time: NaiveDateTime, parameter: Parameter, value: Option<f64>) -> Self {
        Self {
            time,
            parameter,
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// The UTC calendar day this reading belongs to.
    pub fn day(&self) -> NaiveDate {
        self.time.date()
    }
}

/// The observations fetched for one location, pollutant set and time span.
///
/// The parameter list is the column shape of the series and is kept even when
/// there are no observations, so downstream tables always get every column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    parameters: Vec<Parameter>,
    observations: Vec<Observation>,
}

/// Result of importing a tabular raw series.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    pub series: RawSeries,
    /// Rows skipped because their timestamp or pollutant could not be parsed.
    pub rejected_rows: usize,
}

impl RawSeries {
    /// Creates an empty series with the given column shape.
    pub fn new(parameters: &[Parameter]) -> Self {
        let mut series = Self::default();
        for p in parameters {
            series.add_parameter(*p);
        }
        series
    }

    pub fn with_observations(
        parameters: &[Parameter],
        observations: impl IntoIterator<Item = Observation>,
    ) -> Self {
        let mut series = Self::new(parameters);
        for observation in observations {
            series.push(observation);
        }
        series
    }

    /// Appends an observation, extending the column shape if its pollutant is new.
    pub fn push(&mut self, observation: Observation) {
        self.add_parameter(observation.parameter);
        self.observations.push(observation);
    }

    fn add_parameter(&mut self, parameter: Parameter) {
        if !self.parameters.contains(&parameter) {
            self.parameters.push(parameter);
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub(crate) fn into_parts(self) -> (Vec<Parameter>, Vec<Observation>) {
        (self.parameters, self.observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Earliest and latest timestamp, or `None` for an empty series.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.observations.iter().map(|o| o.time).min()?;
        let max = self.observations.iter().map(|o| o.time).max()?;
        Some((min, max))
    }

    /// `true` when observations are ordered by `(time, parameter)` with every key
    /// appearing once.
    pub fn is_sorted_unique(&self) -> bool {
        self.observations
            .windows(2)
            .all(|w| (w[0].time, w[0].parameter) < (w[1].time, w[1].parameter))
    }

    /// Builds a series from a long-format table.
    ///
    /// Expected columns: a timestamp column (`time`, or `date`), `value`, and
    /// optionally `parameter` and `unit`. Without a `parameter` column, every row
    /// is attributed to the first of `parameters`.
    ///
    /// Rows with an unparsable timestamp or an unknown pollutant are skipped and
    /// counted in [`RawImport::rejected_rows`]. Rows with a null value are kept;
    /// the daily reducer drops them.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::MissingColumns`] listing the timestamp and/or value
    /// column when absent (and `parameter` when there is no column and no
    /// fallback parameter), or [`SeriesError::DataFrame`] if a column cannot be
    /// cast.
    pub fn from_dataframe(
        df: &DataFrame,
        parameters: &[Parameter],
    ) -> Result<RawImport, SeriesError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.as_str().to_string())
            .collect();
        let time_name = TIMESTAMP_COLUMNS
            .iter()
            .find(|c| names.iter().any(|n| n == *c));
        let has_value = names.iter().any(|n| n == "value");
        let has_parameter = names.iter().any(|n| n == "parameter");

        let mut missing = Vec::new();
        if time_name.is_none() {
            missing.push("time".to_string());
        }
        if !has_value {
            missing.push("value".to_string());
        }
        if !has_parameter && parameters.is_empty() {
            missing.push("parameter".to_string());
        }
        let time_name = match time_name {
            Some(name) if missing.is_empty() => *name,
            _ => return Err(SeriesError::MissingColumns { missing }),
        };

        let time_col = df.column(time_name)?.cast(&DataType::String)?;
        let times = time_col.str()?;
        let value_col = df.column("value")?.cast(&DataType::Float64)?;
        let values = value_col.f64()?;
        let parameter_col = optional_string_column(df, "parameter", &names)?;
        let unit_col = optional_string_column(df, "unit", &names)?;

        let mut series = RawSeries::new(parameters);
        let mut rejected_rows = 0;
        for i in 0..df.height() {
            let time = times.get(i).and_then(|t| t.to_utc_naive());
            let parameter = match &parameter_col {
                Some(col) => col.str()?.get(i).and_then(Parameter::parse),
                None => parameters.first().copied(),
            };
            let (Some(time), Some(parameter)) = (time, parameter) else {
                rejected_rows += 1;
                continue;
            };
            let unit = match &unit_col {
                Some(col) => col
                    .str()?
                    .get(i)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string),
                None => None,
            };
            series.push(Observation {
                time,
                parameter,
                value: values.get(i).filter(|v| !v.is_nan()),
                unit,
            });
        }

        Ok(RawImport {
            series,
            rejected_rows,
        })
    }

    /// Converts the series into a long-format table with the columns
    /// `time`, `parameter`, `value` and `unit`.
    pub fn to_dataframe(&self) -> Result<DataFrame, SeriesError> {
        let times: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.time.format(TIMESTAMP_FORMAT).to_string())
            .collect();
        let parameters: Vec<&str> = self
            .observations
            .iter()
            .map(|o| o.parameter.canonical_name())
            .collect();
        let values: Vec<Option<f64>> = self.observations.iter().map(|o| o.value).collect();
        let units: Vec<Option<String>> =
            self.observations.iter().map(|o| o.unit.clone()).collect();

        Ok(DataFrame::new(vec![
            Column::new("time".into(), times),
            Column::new("parameter".into(), parameters),
            Column::new("value".into(), values),
            Column::new("unit".into(), units),
        ])?)
    }
}

fn optional_string_column(
    df: &DataFrame,
    name: &str,
    names: &[String],
) -> Result<Option<Column>, SeriesError> {
    if names.iter().any(|n| n == name) {
        Ok(Some(df.column(name)?.cast(&DataType::String)?))
    } else {
        Ok(None)
    }
}
