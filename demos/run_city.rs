use aq_pipeline::{known_city, parse_parameter_list, AqPipelineError, DateRequest, Pipeline, PipelineConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), AqPipelineError> {
    // RUST_LOG=info shows the pipeline stages
    env_logger::init();

    let mut args = env::args().skip(1);
    let city = args.next().unwrap_or_else(|| "milan".to_string());
    let past_days: u32 = args.next().and_then(|d| d.parse().ok()).unwrap_or(30);
    let parameters = parse_parameter_list(&args.next().unwrap_or_else(|| "pm25,pm10,no2,co".to_string()))?;

    let Some(target) = known_city(&city) else {
        eprintln!("Unknown city '{}'", city);
        return Ok(());
    };

    let pipeline = Pipeline::open_meteo(PipelineConfig::builder().timestamped(true).build())?;
    let outcome = pipeline
        .run_city()
        .target(&target)
        .parameters(&parameters)
        .dates(DateRequest::PastDays(past_days))
        .call()
        .await?;

    println!("{}", outcome.report);
    println!("Daily table: {:?}", outcome.paths.daily);
    Ok(())
}
