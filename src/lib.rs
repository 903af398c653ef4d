mod config;
mod error;
mod fetching;
mod pipeline;
mod processing;
mod storage;
mod types;

pub use config::PipelineConfig;
pub use error::AqPipelineError;
pub use pipeline::*;

pub use types::dates::{AnyDate, AnyTimestamp, DateSpan, Month, Year};
pub use types::error::{DateBound, DateRangeError, ParameterError, SeriesError};
pub use types::frames::daily_matrix::{DailyColumn, DailyMatrix};
pub use types::frames::raw_series::{Observation, RawImport, RawSeries};
pub use types::location::{known_city, known_city_keys, LatLon, Target};
pub use types::parameter::*;
pub use types::stats::{Metrics, SeriesStats};

pub use processing::aqi::*;
pub use processing::metrics::compute_metrics;
pub use processing::reduce::{interpolate_interior, reduce, reduce_with_summary, ReduceSummary};
pub use processing::report::{SummaryReport, REPORT_HEADER};
pub use processing::windows::*;

pub use fetching::error::FetchError;
pub use fetching::open_meteo::*;
pub use fetching::source::ObservationSource;
pub use fetching::window_fetcher::WindowFetcher;

pub use storage::artifacts::ArtifactPaths;
pub use storage::csv_store::*;
pub use storage::error::StorageError;
