use aq_pipeline::{resolve_cities, AqPipelineError, DateRequest, Pipeline, PipelineConfig};
use chrono::NaiveDate;

#[tokio::main]
async fn main() -> Result<(), AqPipelineError> {
    env_logger::init();

    let config = PipelineConfig::from_json_str(
        r#"{"output_root": "aq_output", "interpolate": true, "courtesy_delay_ms": 1000}"#,
    )
    .unwrap();

    let targets = resolve_cities("milan,paris,rome,berlin")?;
    let pipeline = Pipeline::open_meteo(config)?;

    // longer than one window, so every city is fetched in several requests
    let summary = pipeline
        .run_batch()
        .targets(&targets)
        .dates(DateRequest::Range {
            start: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
        })
        .call()
        .await?;

    for outcome in &summary.succeeded {
        println!("{}\n", outcome.report);
    }
    for (target, error) in &summary.failed {
        eprintln!("{} failed: {}", target.label(), error);
    }
    Ok(())
}
