use crate::processing::windows::DEFAULT_MAX_WINDOW_DAYS;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables of a [`crate::Pipeline`].
///
/// Every field has a default, so both the builder and a JSON document only
/// need to name what they change.
///
/// # Examples
///
/// ```
/// use aq_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .interpolate(false)
///     .output_root("out")
///     .build();
/// assert_eq!(config.max_window_days, 90);
///
/// let from_json = PipelineConfig::from_json_str(r#"{"fetch_concurrency": 2}"#).unwrap();
/// assert_eq!(from_json.fetch_concurrency, 2);
/// assert!(from_json.interpolate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Longest window requested from the source in one call, in days.
    #[builder(default = DEFAULT_MAX_WINDOW_DAYS)]
    pub max_window_days: u32,

    /// Fill interior gaps of the daily matrix.
    #[builder(default = true)]
    pub interpolate: bool,

    /// Append the run date to every artifact file name.
    #[builder(default)]
    pub timestamped: bool,

    /// Directory the `data/` and `reports/` trees are written below.
    #[builder(default = PathBuf::from("."), into)]
    pub output_root: PathBuf,

    /// Days fetched when a run does not name a date range.
    #[builder(default = 30)]
    pub default_past_days: u32,

    /// Window requests in flight at once.
    #[builder(default = 1)]
    pub fetch_concurrency: usize,

    /// Pause before every window request after the first, in milliseconds.
    #[builder(default = 1000)]
    pub courtesy_delay_ms: u64,

    #[builder(default = 30)]
    pub request_timeout_secs: u64,
}

impl PipelineConfig {
    /// Parses a JSON object; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_window_days, 90);
        assert!(config.interpolate);
        assert!(!config.timestamped);
        assert_eq!(config.output_root, PathBuf::from("."));
        assert_eq!(config.default_past_days, 30);
        assert_eq!(config.fetch_concurrency, 1);
        assert_eq!(config.courtesy_delay(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_json_overrides() -> Result<(), serde_json::Error> {
        let config = PipelineConfig::from_json_str(
            r#"{"interpolate": false, "output_root": "/var/aq", "courtesy_delay_ms": 0}"#,
        )?;
        assert!(!config.interpolate);
        assert_eq!(config.output_root, PathBuf::from("/var/aq"));
        assert_eq!(config.courtesy_delay(), Duration::ZERO);
        assert_eq!(config.max_window_days, 90);

        assert!(PipelineConfig::from_json_str(r#"{"fetch_concurrency": "many"}"#).is_err());
        Ok(())
    }
}
