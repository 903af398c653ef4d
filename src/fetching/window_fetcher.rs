use crate::fetching::error::FetchError;
use crate::fetching::source::ObservationSource;
use crate::processing::windows::{merge_fragments, DateWindow};
use crate::types::frames::raw_series::RawSeries;
use crate::types::location::LatLon;
use crate::types::parameter::Parameter;
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{debug, info};
use std::time::Duration;

/// Fetches a list of date windows from an [`ObservationSource`] and stitches
/// the fragments into one series.
///
/// At most `concurrency` requests are in flight; every request but the first
/// waits `courtesy_delay` before it is sent. Fragments are merged after all of
/// them arrived, so the result does not depend on completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFetcher {
    concurrency: usize,
    courtesy_delay: Duration,
}

impl WindowFetcher {
    pub fn new(concurrency: usize, courtesy_delay: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            courtesy_delay,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// # Errors
    ///
    /// Returns [`FetchError::Window`] wrapping the first failure; the
    /// remaining windows are not awaited.
    pub async fn fetch<S: ObservationSource>(
        &self,
        source: &S,
        location: LatLon,
        parameters: &[Parameter],
        windows: &[DateWindow],
    ) -> Result<RawSeries, FetchError> {
        let delay = self.courtesy_delay;
        let fragments: Vec<RawSeries> = stream::iter(windows.iter().copied().enumerate())
            .map(|(i, window)| async move {
                if i > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!("Fetching window {}/{}: {}", i + 1, windows.len(), window);
                source
                    .fetch(location, parameters, window)
                    .await
                    .map_err(|e| FetchError::Window {
                        window,
                        source: Box::new(e),
                    })
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let merged = merge_fragments(parameters, fragments);
        info!(
            "Stitched {} windows into {} observations for {}",
            windows.len(),
            merged.len(),
            location
        );
        Ok(merged)
    }
}

impl Default for WindowFetcher {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetching::source::fake::FakeSource;
    use crate::processing::windows::{DateRequest, WindowPlanner};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_stitches_sorted_unique() -> Result<(), Box<dyn std::error::Error>> {
        let planner = WindowPlanner::new(7, ymd(2024, 12, 31))?;
        let windows = planner.plan(DateRequest::Range {
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 20),
        })?;
        assert_eq!(windows.len(), 3);

        let source = FakeSource::default();
        let fetcher = WindowFetcher::new(3, Duration::ZERO);
        let series = fetcher
            .fetch(&source, LatLon(45.0, 9.0), &[Parameter::Pm25, Parameter::Pm10], &windows)
            .await?;

        assert_eq!(source.requested(), windows);
        assert_eq!(series.len(), 20 * 2 * 2);
        assert!(series.is_sorted_unique());
        assert_eq!(series.parameters(), &[Parameter::Pm25, Parameter::Pm10]);
        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_windows_are_deduplicated() -> Result<(), FetchError> {
        let windows = [
            DateWindow {
                start: ymd(2024, 1, 1),
                end: ymd(2024, 1, 3),
            },
            DateWindow {
                start: ymd(2024, 1, 3),
                end: ymd(2024, 1, 4),
            },
        ];
        let source = FakeSource::default();
        let series = WindowFetcher::new(2, Duration::ZERO)
            .fetch(&source, LatLon(0.0, 0.0), &[Parameter::NitrogenDioxide], &windows)
            .await?;
        assert_eq!(series.len(), 4 * 2);
        assert!(series.is_sorted_unique());
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_names_the_window() {
        let bad = DateWindow {
            start: ymd(2024, 2, 1),
            end: ymd(2024, 2, 2),
        };
        let windows = [
            DateWindow {
                start: ymd(2024, 1, 30),
                end: ymd(2024, 1, 31),
            },
            bad,
        ];
        let source = FakeSource::failing_on([bad]);
        let result = WindowFetcher::new(1, Duration::from_millis(5))
            .fetch(&source, LatLon(0.0, 0.0), &[Parameter::Pm10], &windows)
            .await;
        match result {
            Err(FetchError::Window { window, .. }) => assert_eq!(window, bad),
            other => panic!("expected window failure, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        assert_eq!(WindowFetcher::new(0, Duration::ZERO).concurrency(), 1);
        assert_eq!(WindowFetcher::new(4, Duration::ZERO).concurrency(), 4);
        assert_eq!(WindowFetcher::default().concurrency(), 1);
    }

    #[tokio::test]
    async fn test_no_windows_yields_empty_shape() -> Result<(), FetchError> {
        let source = FakeSource::default();
        let series = WindowFetcher::default()
            .fetch(&source, LatLon(0.0, 0.0), &[Parameter::CarbonMonoxide], &[])
            .await?;
        assert!(series.is_empty());
        assert_eq!(series.parameters(), &[Parameter::CarbonMonoxide]);
        Ok(())
    }
}
