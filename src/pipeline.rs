//! Runs fetch, merge, reduce, persist, metrics and report for one or more
//! targets.

use crate::config::PipelineConfig;
use crate::error::AqPipelineError;
use crate::fetching::open_meteo::OpenMeteoClient;
use crate::fetching::source::ObservationSource;
use crate::fetching::window_fetcher::WindowFetcher;
use crate::processing::reduce::{reduce_with_summary, ReduceSummary};
use crate::processing::report::SummaryReport;
use crate::processing::windows::{DateRequest, DateWindow, WindowPlanner};
use crate::storage::artifacts::ArtifactPaths;
use crate::storage::csv_store::{write_daily, write_raw, write_report};
use crate::types::frames::daily_matrix::DailyMatrix;
use crate::types::location::{known_city, known_city_keys, Target};
use crate::types::parameter::Parameter;
use bon::bon;
use chrono::Utc;
use log::{info, warn};

/// What a successful run for one target produced.
#[derive(Debug, Clone)]
pub struct CityOutcome {
    pub target: Target,
    pub windows: Vec<DateWindow>,
    pub paths: ArtifactPaths,
    pub matrix: DailyMatrix,
    pub reduce_summary: ReduceSummary,
    pub report: SummaryReport,
}

/// Results of a batch run, in target order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<CityOutcome>,
    pub failed: Vec<(Target, AqPipelineError)>,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The air-quality pipeline over an [`ObservationSource`].
///
/// "Today" is fixed when the pipeline is created and shared by every run it
/// performs, so all windows and file stamps of a batch agree.
///
/// # Examples
///
/// ```rust,no_run
/// # use aq_pipeline::{AqPipelineError, DateRequest, Pipeline, PipelineConfig, known_city};
/// # #[tokio::main]
/// # async fn main() -> Result<(), AqPipelineError> {
/// let pipeline = Pipeline::open_meteo(PipelineConfig::default())?;
/// let milan = known_city("milan").unwrap();
/// let outcome = pipeline
///     .run_city()
///     .target(&milan)
///     .dates(DateRequest::PastDays(14))
///     .call()
///     .await?;
/// println!("{}", outcome.report);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S> {
    source: S,
    config: PipelineConfig,
    planner: WindowPlanner,
    fetcher: WindowFetcher,
}

impl Pipeline<OpenMeteoClient> {
    /// A pipeline backed by the Open-Meteo air-quality API.
    pub fn open_meteo(config: PipelineConfig) -> Result<Self, AqPipelineError> {
        let client = OpenMeteoClient::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::new(client, config)
    }
}

#[bon]
impl<S: ObservationSource> Pipeline<S> {
    /// # Errors
    ///
    /// Returns [`AqPipelineError::DateRange`] if `config.max_window_days` is zero.
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, AqPipelineError> {
        let planner = WindowPlanner::new(config.max_window_days, Utc::now().date_naive())?;
        Ok(Self::with_planner(source, config, planner))
    }

    /// Uses `planner` instead of one anchored at the current date. Its window
    /// span takes precedence over `config.max_window_days`.
    pub fn with_planner(source: S, config: PipelineConfig, planner: WindowPlanner) -> Self {
        let fetcher = WindowFetcher::new(config.fetch_concurrency, config.courtesy_delay());
        Self {
            source,
            config,
            planner,
            fetcher,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn planner(&self) -> &WindowPlanner {
        &self.planner
    }

    /// Runs the whole pipeline for one target and writes its raw table, daily
    /// table and report below the configured output root.
    ///
    /// * `.target(&Target)`: **Required.**
    /// * `.parameters(&[Parameter])`: Optional. Defaults to every supported pollutant.
    /// * `.dates(DateRequest)`: Optional. Defaults to the configured number of past days.
    ///
    /// # Errors
    ///
    /// * [`AqPipelineError::DateRange`] if the request is invalid.
    /// * [`AqPipelineError::Fetch`] if any window cannot be fetched.
    /// * [`AqPipelineError::Storage`] if an artifact cannot be written.
    #[builder]
    pub async fn run_city(
        &self,
        target: &Target,
        parameters: Option<&[Parameter]>,
        dates: Option<DateRequest>,
    ) -> Result<CityOutcome, AqPipelineError> {
        let parameters = self.parameters_or_all(parameters);
        let windows = self.plan(dates)?;
        self.run_planned(target, &parameters, windows).await
    }

    /// Runs every target in order. The date request is validated once up front;
    /// after that a failing target is recorded and the batch moves on.
    ///
    /// Takes the same optional `.parameters(..)` and `.dates(..)` as
    /// [`Pipeline::run_city`], plus the required `.targets(&[Target])`.
    ///
    /// # Errors
    ///
    /// Returns [`AqPipelineError::DateRange`] if the request is invalid; no
    /// target is attempted then.
    #[builder]
    pub async fn run_batch(
        &self,
        targets: &[Target],
        parameters: Option<&[Parameter]>,
        dates: Option<DateRequest>,
    ) -> Result<BatchSummary, AqPipelineError> {
        let parameters = self.parameters_or_all(parameters);
        let windows = self.plan(dates)?;

        let mut summary = BatchSummary::default();
        for target in targets {
            match self.run_planned(target, &parameters, windows.clone()).await {
                Ok(outcome) => summary.succeeded.push(outcome),
                Err(e) => {
                    warn!("Run for {} failed: {}", target.label(), e);
                    summary.failed.push((target.clone(), e));
                }
            }
        }
        info!(
            "Batch finished: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

impl<S: ObservationSource> Pipeline<S> {
    fn parameters_or_all(&self, parameters: Option<&[Parameter]>) -> Vec<Parameter> {
        match parameters {
            Some(p) if !p.is_empty() => p.to_vec(),
            _ => Parameter::all().to_vec(),
        }
    }

    fn plan(&self, dates: Option<DateRequest>) -> Result<Vec<DateWindow>, AqPipelineError> {
        let request = dates.unwrap_or(DateRequest::PastDays(self.config.default_past_days));
        Ok(self.planner.plan(request)?)
    }

    async fn run_planned(
        &self,
        target: &Target,
        parameters: &[Parameter],
        windows: Vec<DateWindow>,
    ) -> Result<CityOutcome, AqPipelineError> {
        let label = target.label();
        let stamp = self
            .config
            .timestamped
            .then(|| self.planner.reference_date());
        let paths = ArtifactPaths::new(&self.config.output_root, &target.slug(), stamp);

        info!("=== {}: FETCH ({} windows) ===", label, windows.len());
        let raw = self
            .fetcher
            .fetch(&self.source, target.location, parameters, &windows)
            .await?;
        write_raw(&raw, &paths.raw).await?;

        info!("=== {}: REDUCE ===", label);
        let (matrix, reduce_summary) = reduce_with_summary(&raw, self.config.interpolate);
        info!(
            "{}: {} observations, {} without value dropped, {} days, {} cells interpolated",
            label,
            reduce_summary.input_rows,
            reduce_summary.dropped_missing,
            reduce_summary.days,
            reduce_summary.interpolated
        );
        if matrix.is_empty() {
            warn!("{}: no usable observations in the requested range", label);
        }
        write_daily(&matrix, &paths.daily).await?;

        info!("=== {}: REPORT ===", label);
        let report = SummaryReport::from_matrix(target.name.as_deref(), &matrix);
        write_report(&report.render(), &paths.report).await?;

        info!("Done: {} -> {:?}, {:?}", label, paths.daily, paths.report);
        Ok(CityOutcome {
            target: target.clone(),
            windows,
            paths,
            matrix,
            reduce_summary,
            report,
        })
    }
}

/// Resolves a comma-separated list of built-in city keys.
///
/// # Errors
///
/// Returns [`AqPipelineError::UnknownCity`] for the first key that is not built in.
pub fn resolve_cities(list: &str) -> Result<Vec<Target>, AqPipelineError> {
    list.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|key| {
            known_city(key).ok_or_else(|| AqPipelineError::UnknownCity {
                city: key.to_lowercase(),
                known: known_city_keys().join(", "),
            })
        })
        .collect()
}
