use crate::fetching::error::FetchError;
use crate::processing::windows::DateWindow;
use crate::types::frames::raw_series::RawSeries;
use crate::types::location::LatLon;
use crate::types::parameter::Parameter;
use std::future::Future;

/// A provider of hourly observations for one location and date window.
///
/// Implementations return the readings of every requested pollutant with
/// timestamps in UTC. The returned series carries `parameters` as its column
/// shape even when the upstream has no data for the window.
pub trait ObservationSource {
    fn fetch(
        &self,
        location: LatLon,
        parameters: &[Parameter],
        window: DateWindow,
    ) -> impl Future<Output = Result<RawSeries, FetchError>> + Send;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::types::frames::raw_series::Observation;
    use chrono::Datelike;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Serves one reading per pollutant at 00:00 and 12:00 of every day, the
    /// value being the day of month. Records every requested window.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub(crate) calls: Mutex<Vec<DateWindow>>,
        pub(crate) failing: HashSet<DateWindow>,
        pub(crate) unit: Option<String>,
    }

    impl FakeSource {
        pub(crate) fn failing_on(windows: impl IntoIterator<Item = DateWindow>) -> Self {
            Self {
                failing: windows.into_iter().collect(),
                ..Self::default()
            }
        }

        pub(crate) fn requested(&self) -> Vec<DateWindow> {
            let mut calls = self.calls.lock().unwrap().clone();
            calls.sort();
            calls
        }
    }

    impl ObservationSource for FakeSource {
        async fn fetch(
            &self,
            _location: LatLon,
            parameters: &[Parameter],
            window: DateWindow,
        ) -> Result<RawSeries, FetchError> {
            self.calls.lock().unwrap().push(window);
            if self.failing.contains(&window) {
                return Err(FetchError::Upstream(format!("no data for {window}")));
            }
            let mut series = RawSeries::new(parameters);
            let days: Vec<_> = window
                .start
                .iter_days()
                .take_while(|d| *d <= window.end)
                .collect();
            // newest first, so merging has to sort
            for day in days.into_iter().rev() {
                for hour in [12, 0] {
                    for parameter in parameters {
                        let time = day.and_hms_opt(hour, 0, 0).unwrap();
                        let value = f64::from(day.day());
                        let mut observation = Observation::new(time, *parameter, Some(value));
                        if let Some(unit) = &self.unit {
                            observation = observation.with_unit(unit.clone());
                        }
                        series.push(observation);
                    }
                }
            }
            Ok(series)
        }
    }
}
