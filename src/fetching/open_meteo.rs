use crate::fetching::error::FetchError;
use crate::fetching::source::ObservationSource;
use crate::processing::windows::DateWindow;
use crate::types::dates::AnyTimestamp;
use crate::types::frames::raw_series::{Observation, RawSeries};
use crate::types::location::LatLon;
use crate::types::parameter::Parameter;
use bon::bon;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const OPEN_METEO_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Default connect-and-read timeout of one request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches hourly pollutant concentrations from the Open-Meteo air-quality API.
///
/// # Examples
///
/// ```rust
/// # use aq_pipeline::{OpenMeteoClient, FetchError};
/// # use std::time::Duration;
/// # fn run() -> Result<(), FetchError> {
/// let client = OpenMeteoClient::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

#[bon]
impl OpenMeteoClient {
    /// Creates a client.
    ///
    /// * `.base_url(..)`: Optional. Endpoint to query, defaults to [`OPEN_METEO_AIR_QUALITY_URL`].
    /// * `.timeout(Duration)`: Optional. Defaults to [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be initialised.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| OPEN_METEO_AIR_QUALITY_URL.to_string()),
        })
    }
}

impl OpenMeteoClient {
    async fn request(
        &self,
        location: LatLon,
        parameters: &[Parameter],
        window: DateWindow,
    ) -> Result<String, FetchError> {
        let hourly = parameters
            .iter()
            .map(|p| p.canonical_name())
            .collect::<Vec<_>>()
            .join(",");
        let description = format!("{} [{} {}]", self.base_url, location, window);
        info!("Requesting {} for {} over {}", hourly, location, window);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", location.0.to_string()),
                ("longitude", location.1.to_string()),
                ("hourly", hourly),
                ("timezone", "UTC".to_string()),
                ("start_date", window.start.to_string()),
                ("end_date", window.end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(description.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", description, e);
                return Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url: description,
                        status,
                        source: e,
                    },
                    None => FetchError::NetworkRequest(description, e),
                });
            }
        };

        response.text().await.map_err(|e| FetchError::Body {
            url: description,
            source: e,
        })
    }
}

impl ObservationSource for OpenMeteoClient {
    async fn fetch(
        &self,
        location: LatLon,
        parameters: &[Parameter],
        window: DateWindow,
    ) -> Result<RawSeries, FetchError> {
        let body = self.request(location, parameters, window).await?;
        let series = parse_air_quality_json(&body, parameters)?;
        info!(
            "Received {} observations for {} over {}",
            series.len(),
            location,
            window
        );
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct AirQualityPayload {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    hourly: Option<HourlyBlock>,
    #[serde(default)]
    hourly_units: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

/// Converts an Open-Meteo air-quality response body into a [`RawSeries`].
///
/// A response without an `hourly` block is an empty series. Slots whose
/// timestamp cannot be parsed are skipped, `null` readings are kept as
/// observations without a value.
///
/// # Errors
///
/// * [`FetchError::Json`] if the body is not the expected JSON document.
/// * [`FetchError::Upstream`] if the API reports an error.
/// * [`FetchError::MalformedPayload`] if a pollutant array is not aligned with `time`.
pub fn parse_air_quality_json(body: &str, parameters: &[Parameter]) -> Result<RawSeries, FetchError> {
    let payload: AirQualityPayload = serde_json::from_str(body)?;
    if payload.error {
        return Err(FetchError::Upstream(
            payload.reason.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let mut series = RawSeries::new(parameters);
    let Some(hourly) = payload.hourly else {
        warn!("Air-quality response carries no hourly block");
        return Ok(series);
    };

    let times: Vec<_> = hourly
        .time
        .iter()
        .map(|t| t.as_str().to_utc_naive())
        .collect();
    let unparsable = times.iter().filter(|t| t.is_none()).count();
    if unparsable > 0 {
        warn!("Skipping {} hourly slots with unparsable timestamps", unparsable);
    }

    for parameter in parameters {
        let name = parameter.canonical_name();
        let Some(values) = hourly.series.get(name) else {
            warn!("Air-quality response has no '{}' series", name);
            continue;
        };
        if values.len() != times.len() {
            return Err(FetchError::MalformedPayload(format!(
                "'{}' has {} values for {} timestamps",
                name,
                values.len(),
                times.len()
            )));
        }
        let unit = payload
            .hourly_units
            .get(name)
            .map(|u| u.trim())
            .filter(|u| !u.is_empty());
        for (time, value) in times.iter().zip(values) {
            let Some(time) = time else {
                continue;
            };
            let mut observation = Observation::new(*time, *parameter, *value);
            if let Some(unit) = unit {
                observation = observation.with_unit(unit);
            }
            series.push(observation);
        }
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BODY: &str = r#"{
        "latitude": 45.46,
        "longitude": 9.19,
        "hourly_units": {"time": "iso8601", "pm2_5": "μg/m³", "pm10": "μg/m³"},
        "hourly": {
            "time": ["2024-01-01T00:00", "2024-01-01T01:00", "garbage"],
            "pm2_5": [10.5, null, 3.0],
            "pm10": [20.0, 22.0, 4.0]
        }
    }"#;

    #[test]
    fn test_parse_hourly_block() -> Result<(), FetchError> {
        let series = parse_air_quality_json(BODY, &[Parameter::Pm25, Parameter::Pm10])?;
        assert_eq!(series.parameters(), &[Parameter::Pm25, Parameter::Pm10]);
        assert_eq!(series.len(), 4);

        let first = &series.observations()[0];
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(first.time, midnight);
        assert_eq!(first.parameter, Parameter::Pm25);
        assert_eq!(first.value, Some(10.5));
        assert_eq!(first.unit.as_deref(), Some("μg/m³"));
        assert_eq!(series.observations()[1].value, None);
        Ok(())
    }

    #[test]
    fn test_missing_series_and_hourly_block() -> Result<(), FetchError> {
        let series = parse_air_quality_json(BODY, &[Parameter::CarbonMonoxide])?;
        assert!(series.is_empty());
        assert_eq!(series.parameters(), &[Parameter::CarbonMonoxide]);

        let series = parse_air_quality_json(r#"{"latitude": 1.0}"#, &[Parameter::Pm10])?;
        assert!(series.is_empty());
        assert_eq!(series.parameters(), &[Parameter::Pm10]);
        Ok(())
    }

    #[test]
    fn test_upstream_error_and_misaligned_series() {
        let rejected = parse_air_quality_json(
            r#"{"error": true, "reason": "Parameter 'hourly' is invalid"}"#,
            &[Parameter::Pm10],
        );
        assert!(matches!(rejected, Err(FetchError::Upstream(reason)) if reason.contains("hourly")));

        let ragged = parse_air_quality_json(
            r#"{"hourly": {"time": ["2024-01-01T00:00"], "pm10": [1.0, 2.0]}}"#,
            &[Parameter::Pm10],
        );
        assert!(matches!(ragged, Err(FetchError::MalformedPayload(_))));

        assert!(matches!(
            parse_air_quality_json("not json", &[Parameter::Pm10]),
            Err(FetchError::Json(_))
        ));
    }

    #[test]
    fn test_builder_defaults() -> Result<(), FetchError> {
        let client = OpenMeteoClient::builder().build()?;
        assert_eq!(client.base_url, OPEN_METEO_AIR_QUALITY_URL);
        let client = OpenMeteoClient::builder()
            .base_url("http://localhost:9/v1/air-quality")
            .timeout(Duration::from_millis(50))
            .build()?;
        assert_eq!(client.base_url, "http://localhost:9/v1/air-quality");
        Ok(())
    }
}
