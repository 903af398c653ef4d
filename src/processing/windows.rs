//! Splits requested date spans into windows the upstream API accepts, and
//! stitches the fetched fragments back into a single [`RawSeries`].

use crate::types::dates::AnyDate;
use crate::types::error::{DateBound, DateRangeError};
use crate::types::frames::raw_series::RawSeries;
use crate::types::parameter::Parameter;
use chrono::{Days, NaiveDate, Utc};
use std::fmt;

/// Longest span, in days, the air-quality API serves in one request.
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 90;

/// An inclusive range of calendar days fetched in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// What period of data a pipeline run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRequest {
    /// An explicit inclusive range.
    Range { start: NaiveDate, end: NaiveDate },
    /// The last `n` calendar days, today included.
    PastDays(u32),
}

impl DateRequest {
    /// Builds an explicit range from anything resolving to dates: the start of
    /// `start`'s span and the end of `end`'s span are used, so
    /// `DateRequest::range(Year(2023), Year(2023))` covers the whole year.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::Unparsable`] naming the bound that did not resolve.
    ///
    /// # Examples
    ///
    /// ```
    /// use aq_pipeline::{DateRequest, Month};
    /// use chrono::NaiveDate;
    ///
    /// let request = DateRequest::range("2024-01-15", Month::new(2, 2024)).unwrap();
    /// assert_eq!(
    ///     request,
    ///     DateRequest::Range {
    ///         start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    ///         end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
    ///     }
    /// );
    /// ```
    pub fn range(
        start: impl AnyDate + fmt::Debug,
        end: impl AnyDate + fmt::Debug,
    ) -> Result<Self, DateRangeError> {
        let start_label = format!("{:?}", start);
        let end_label = format!("{:?}", end);
        let start = start
            .get_date_span()
            .ok_or(DateRangeError::Unparsable {
                bound: DateBound::Start,
                input: start_label,
            })?
            .start;
        let end = end
            .get_date_span()
            .ok_or(DateRangeError::Unparsable {
                bound: DateBound::End,
                input: end_label,
            })?
            .end;
        Ok(DateRequest::Range { start, end })
    }
}

/// Plans fetch windows relative to a fixed reference date.
///
/// The reference date ("today") is captured once when the planner is created
/// and every window of a run derives from it; fetching never re-reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    max_span_days: u32,
    today: NaiveDate,
}

impl WindowPlanner {
    /// A planner anchored at `today`.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::ZeroWindowSpan`] if `max_span_days` is 0.
    pub fn new(max_span_days: u32, today: NaiveDate) -> Result<Self, DateRangeError> {
        if max_span_days == 0 {
            return Err(DateRangeError::ZeroWindowSpan);
        }
        Ok(Self {
            max_span_days,
            today,
        })
    }

    /// A planner with the default span, anchored at the current UTC date.
    pub fn today() -> Self {
        Self {
            max_span_days: DEFAULT_MAX_WINDOW_DAYS,
            today: Utc::now().date_naive(),
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.today
    }

    pub fn max_span_days(&self) -> u32 {
        self.max_span_days
    }

    /// Resolves a request into an absolute inclusive span, validating it.
    ///
    /// # Errors
    ///
    /// * [`DateRangeError::Invalid`] naming `start` when it is not strictly before
    ///   `end`, or naming `end` when it lies after the reference date.
    /// * [`DateRangeError::Invalid`] naming `start` for a `PastDays(n)` reaching
    ///   before the earliest representable date.
    /// * [`DateRangeError::EmptyPastDays`] for `PastDays(0)`.
    pub fn resolve(&self, request: DateRequest) -> Result<DateWindow, DateRangeError> {
        match request {
            DateRequest::Range { start, end } => {
                if start >= end {
                    return Err(DateRangeError::Invalid {
                        bound: DateBound::Start,
                        date: start,
                        reason: format!("must be before end date {}", end),
                    });
                }
                if end > self.today {
                    return Err(DateRangeError::Invalid {
                        bound: DateBound::End,
                        date: end,
                        reason: format!("is in the future (today is {})", self.today),
                    });
                }
                Ok(DateWindow { start, end })
            }
            DateRequest::PastDays(0) => Err(DateRangeError::EmptyPastDays),
            DateRequest::PastDays(days) => {
                let start = self
                    .today
                    .checked_sub_days(Days::new(u64::from(days) - 1))
                    .ok_or_else(|| DateRangeError::Invalid {
                        bound: DateBound::Start,
                        date: self.today,
                        reason: format!("cannot go back {} days", days),
                    })?;
                Ok(DateWindow {
                    start,
                    end: self.today,
                })
            }
        }
    }

    /// Splits a request into chronological, contiguous, non-overlapping windows
    /// of at most `max_span_days` days. The last window ends exactly at the
    /// requested end.
    ///
    /// # Errors
    ///
    /// Same as [`WindowPlanner::resolve`].
    ///
    /// # Examples
    ///
    /// ```
    /// use aq_pipeline::{DateRequest, WindowPlanner};
    /// use chrono::NaiveDate;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    /// let planner = WindowPlanner::new(90, today).unwrap();
    /// let windows = planner.plan(DateRequest::PastDays(200)).unwrap();
    /// assert_eq!(windows.len(), 3);
    /// assert_eq!(windows[2].end, today);
    /// assert_eq!(windows[2].days(), 20);
    /// ```
    pub fn plan(&self, request: DateRequest) -> Result<Vec<DateWindow>, DateRangeError> {
        let span = self.resolve(request)?;
        Ok(chunk_span(span, self.max_span_days))
    }
}

fn chunk_span(span: DateWindow, max_span_days: u32) -> Vec<DateWindow> {
    let step = Days::new(u64::from(max_span_days) - 1);
    let mut windows = Vec::new();
    let mut cursor = span.start;
    while cursor <= span.end {
        let end = cursor
            .checked_add_days(step)
            .map_or(span.end, |d| d.min(span.end));
        windows.push(DateWindow { start: cursor, end });
        match end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    windows
}

/// Concatenates fetched fragments into one series sorted by `(time, parameter)`
/// with duplicate keys removed.
///
/// When overlapping fragments disagree on the value for a key, which row
/// survives is unspecified and may depend on fragment order; the result is
/// order-independent only when duplicates agree. The column shape is
/// `parameters` followed by any other pollutant first seen in the fragments;
/// with no fragments the result is an empty series of that shape.
pub fn merge_fragments(parameters: &[Parameter], fragments: Vec<RawSeries>) -> RawSeries {
    let mut shape: Vec<Parameter> = parameters.to_vec();
    let mut observations = Vec::new();
    for fragment in fragments {
        let (fragment_parameters, fragment_observations) = fragment.into_parts();
        for p in fragment_parameters {
            if !shape.contains(&p) {
                shape.push(p);
            }
        }
        observations.extend(fragment_observations);
    }
    observations.sort_by_key(|o| (o.time, o.parameter));
    observations.dedup_by_key(|o| (o.time, o.parameter));
    RawSeries::with_observations(&shape, observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dates::Year;
    use crate::types::frames::raw_series::Observation;
    use chrono::NaiveDateTime;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn planner() -> WindowPlanner {
        WindowPlanner::new(90, ymd(2025, 6, 30)).unwrap()
    }

    fn assert_exact_cover(windows: &[DateWindow], start: NaiveDate, end: NaiveDate, max: i64) {
        assert_eq!(windows.first().unwrap().start, start);
        assert_eq!(windows.last().unwrap().end, end);
        for w in windows {
            assert!(w.start <= w.end);
            assert!(w.days() <= max, "window {} longer than {}", w, max);
        }
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
        }
        let covered: i64 = windows.iter().map(|w| w.days()).sum();
        assert_eq!(covered, (end - start).num_days() + 1);
    }

    #[test]
    fn test_short_range_is_single_window() {
        let windows = planner()
            .plan(DateRequest::Range {
                start: ymd(2025, 1, 1),
                end: ymd(2025, 1, 31),
            })
            .unwrap();
        assert_eq!(
            windows,
            vec![DateWindow {
                start: ymd(2025, 1, 1),
                end: ymd(2025, 1, 31)
            }]
        );
    }

    #[test]
    fn test_exactly_max_span_is_single_window() {
        let start = ymd(2025, 1, 1);
        let end = start + Days::new(89);
        let windows = planner().plan(DateRequest::Range { start, end }).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].days(), 90);
    }

    #[test]
    fn test_long_ranges_cover_exactly_once() {
        let p = planner();
        for (start, end) in [
            (ymd(2023, 1, 1), ymd(2024, 12, 31)),
            (ymd(2024, 2, 28), ymd(2024, 5, 28)),
            (ymd(2020, 7, 4), ymd(2025, 6, 30)),
        ] {
            let windows = p.plan(DateRequest::Range { start, end }).unwrap();
            assert_exact_cover(&windows, start, end, 90);
        }
    }

    #[test]
    fn test_small_span_planner() {
        let p = WindowPlanner::new(1, ymd(2025, 6, 30)).unwrap();
        let windows = p.plan(DateRequest::PastDays(3)).unwrap();
        assert_eq!(windows.len(), 3);
        assert_exact_cover(&windows, ymd(2025, 6, 28), ymd(2025, 6, 30), 1);
        assert!(matches!(
            WindowPlanner::new(0, ymd(2025, 6, 30)),
            Err(DateRangeError::ZeroWindowSpan)
        ));
    }

    #[test]
    fn test_huge_spans_do_not_overflow() {
        match planner().plan(DateRequest::PastDays(u32::MAX)) {
            Err(DateRangeError::Invalid { bound, .. }) => assert_eq!(bound, DateBound::Start),
            other => panic!("expected invalid start, got {:?}", other),
        }

        let wide = WindowPlanner::new(u32::MAX, ymd(2025, 6, 30)).unwrap();
        let windows = wide
            .plan(DateRequest::Range {
                start: ymd(2025, 1, 1),
                end: ymd(2025, 1, 31),
            })
            .unwrap();
        assert_eq!(
            windows,
            vec![DateWindow {
                start: ymd(2025, 1, 1),
                end: ymd(2025, 1, 31)
            }]
        );
        assert_eq!(wide.plan(DateRequest::PastDays(400)).unwrap().len(), 1);
    }

    #[test]
    fn test_past_days_anchor_is_reference_date() {
        let p = planner();
        let windows = p.plan(DateRequest::PastDays(365)).unwrap();
        assert_exact_cover(&windows, ymd(2024, 7, 1), ymd(2025, 6, 30), 90);
        assert_eq!(windows.len(), 5);
        // planning twice with the same planner yields the same windows
        assert_eq!(windows, p.plan(DateRequest::PastDays(365)).unwrap());
        assert_eq!(
            p.resolve(DateRequest::PastDays(1)).unwrap(),
            DateWindow {
                start: ymd(2025, 6, 30),
                end: ymd(2025, 6, 30)
            }
        );
    }

    #[test]
    fn test_invalid_ranges_name_the_bound() {
        let p = planner();
        match p.plan(DateRequest::Range {
            start: ymd(2025, 1, 2),
            end: ymd(2025, 1, 2),
        }) {
            Err(DateRangeError::Invalid { bound, .. }) => assert_eq!(bound, DateBound::Start),
            other => panic!("expected invalid start, got {:?}", other),
        }
        match p.plan(DateRequest::Range {
            start: ymd(2025, 6, 1),
            end: ymd(2025, 7, 1),
        }) {
            Err(DateRangeError::Invalid { bound, date, .. }) => {
                assert_eq!(bound, DateBound::End);
                assert_eq!(date, ymd(2025, 7, 1));
            }
            other => panic!("expected invalid end, got {:?}", other),
        }
        assert!(matches!(
            p.plan(DateRequest::PastDays(0)),
            Err(DateRangeError::EmptyPastDays)
        ));
    }

    #[test]
    fn test_request_from_periods() {
        let request = DateRequest::range(Year(2023), Year(2024)).unwrap();
        assert_eq!(
            request,
            DateRequest::Range {
                start: ymd(2023, 1, 1),
                end: ymd(2024, 12, 31)
            }
        );
        assert!(matches!(
            DateRequest::range("2024-01-01", "tomorrow"),
            Err(DateRangeError::Unparsable {
                bound: DateBound::End,
                ..
            })
        ));
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        ymd(2024, 1, day).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn fragment(hours: &[(u32, u32)]) -> RawSeries {
        RawSeries::with_observations(
            &[Parameter::Pm25],
            hours
                .iter()
                .map(|(d, h)| Observation::new(at(*d, *h), Parameter::Pm25, Some(f64::from(*h)))),
        )
    }

    #[test]
    fn test_merge_sorts_and_deduplicates() {
        let merged = merge_fragments(
            &[Parameter::Pm25],
            vec![fragment(&[(2, 1), (2, 0)]), fragment(&[(1, 5), (2, 0), (1, 23)])],
        );
        let times: Vec<_> = merged.observations().iter().map(|o| o.time).collect();
        assert_eq!(times, vec![at(1, 5), at(1, 23), at(2, 0), at(2, 1)]);
        assert!(merged.is_sorted_unique());
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = fragment(&[(1, 0), (1, 1), (1, 2)]);
        let b = fragment(&[(1, 2), (1, 3)]);
        let c = fragment(&[(3, 0), (1, 0)]);
        let forward = merge_fragments(&[Parameter::Pm25], vec![a.clone(), b.clone(), c.clone()]);
        let backward = merge_fragments(&[Parameter::Pm25], vec![c.clone(), b.clone(), a.clone()]);
        let shuffled = merge_fragments(&[Parameter::Pm25], vec![b, a, c]);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_merge_keeps_one_row_for_conflicting_duplicates() {
        let reading = |v: f64| {
            RawSeries::with_observations(
                &[Parameter::Pm25],
                vec![Observation::new(at(1, 0), Parameter::Pm25, Some(v))],
            )
        };
        let merged = merge_fragments(&[Parameter::Pm25], vec![reading(1.0), reading(2.0)]);
        assert_eq!(merged.len(), 1);
        let kept = merged.observations()[0].value;
        assert!(kept == Some(1.0) || kept == Some(2.0));
    }

    #[test]
    fn test_merge_keeps_distinct_parameters_at_same_time() {
        let mixed = RawSeries::with_observations(
            &[Parameter::Pm10],
            vec![
                Observation::new(at(1, 0), Parameter::Pm10, Some(1.0)),
                Observation::new(at(1, 0), Parameter::Pm25, Some(2.0)),
            ],
        );
        let merged = merge_fragments(&[Parameter::Pm25], vec![mixed]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.parameters(), &[Parameter::Pm25, Parameter::Pm10]);
    }

    #[test]
    fn test_merge_of_nothing_keeps_shape() {
        let merged = merge_fragments(&[Parameter::Pm25, Parameter::CarbonMonoxide], Vec::new());
        assert!(merged.is_empty());
        assert_eq!(
            merged.parameters(),
            &[Parameter::Pm25, Parameter::CarbonMonoxide]
        );
    }
}
