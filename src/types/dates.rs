//! Flexible date and timestamp inputs.
//!
//! [`AnyDate`] lets date-range requests be built from `NaiveDate`s, `YYYY-MM-DD`
//! strings, whole [`Year`]s or [`Month`]s. [`AnyTimestamp`] normalises the many
//! timestamp shapes upstream sources emit into a timezone-naive UTC instant.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl Year {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// An inclusive span of calendar days.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    let last_of_current = first_of_next - Duration::days(1);
    Some(chrono::Datelike::day(&last_of_current))
}

/// Anything that resolves to a span of calendar days.
pub trait AnyDate {
    fn get_date_span(self) -> Option<DateSpan>;
}

impl AnyDate for NaiveDate {
    fn get_date_span(self) -> Option<DateSpan> {
        Some(DateSpan {
            start: self,
            end: self,
        })
    }
}

impl AnyDate for &str {
    fn get_date_span(self) -> Option<DateSpan> {
        NaiveDate::parse_from_str(self.trim(), "%Y-%m-%d")
            .ok()?
            .get_date_span()
    }
}

impl AnyDate for String {
    fn get_date_span(self) -> Option<DateSpan> {
        self.as_str().get_date_span()
    }
}

impl AnyDate for Year {
    fn get_date_span(self) -> Option<DateSpan> {
        Some(DateSpan {
            start: NaiveDate::from_ymd_opt(self.0, 1, 1)?,
            end: NaiveDate::from_ymd_opt(self.0, 12, 31)?,
        })
    }
}

impl AnyDate for Month {
    fn get_date_span(self) -> Option<DateSpan> {
        let (year, month) = (self.year(), self.month());
        Some(DateSpan {
            start: NaiveDate::from_ymd_opt(year, month, 1)?,
            end: NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?,
        })
    }
}

/// Anything that resolves to a timezone-naive UTC instant.
///
/// Strings are tried as RFC 3339 (with `Z` or an explicit offset), then as the
/// offset-less forms Open-Meteo and spreadsheet exports use, then as a bare date
/// (midnight). `None` means the timestamp is unparsable.
pub trait AnyTimestamp {
    fn to_utc_naive(self) -> Option<NaiveDateTime>;
}

impl AnyTimestamp for NaiveDateTime {
    fn to_utc_naive(self) -> Option<NaiveDateTime> {
        Some(self)
    }
}

impl AnyTimestamp for DateTime<Utc> {
    fn to_utc_naive(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl AnyTimestamp for DateTime<FixedOffset> {
    fn to_utc_naive(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

impl AnyTimestamp for &str {
    fn to_utc_naive(self) -> Option<NaiveDateTime> {
        let s = self.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.to_utc_naive();
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive);
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

impl AnyTimestamp for String {
    fn to_utc_naive(self) -> Option<NaiveDateTime> {
        self.as_str().to_utc_naive()
    }
}
