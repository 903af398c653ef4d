use chrono::NaiveDate;
use polars::error::PolarsError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Unsupported parameters: {unsupported:?}. Allowed: {allowed:?}")]
    Unsupported {
        unsupported: Vec<String>,
        allowed: Vec<String>,
    },
}

/// Which end of a requested date range was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Start => write!(f, "start"),
            DateBound::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DateRangeError {
    #[error("Invalid {bound} date {date}: {reason}")]
    Invalid {
        bound: DateBound,
        date: NaiveDate,
        reason: String,
    },

    #[error("Could not parse {bound} date '{input}', expected YYYY-MM-DD")]
    Unparsable { bound: DateBound, input: String },

    #[error("A past-days request must cover at least one day")]
    EmptyPastDays,

    #[error("Maximum window span must be at least one day")]
    ZeroWindowSpan,
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Raw input is missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown pollutant column '{0}' in daily table")]
    UnknownColumn(String),

    #[error("Could not parse date '{0}' in daily table")]
    InvalidDate(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}
