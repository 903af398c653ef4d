use aq_pipeline::{
    compute_metrics, read_raw, reduce_with_summary, AqiCategory, AqPipelineError, Parameter,
    SummaryReport,
};
use std::env;
use std::path::PathBuf;

/// Re-analyses a raw table written by an earlier run, without any network access.
#[tokio::main]
async fn main() -> Result<(), AqPipelineError> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/raw/milan_multi.csv"));

    let import = read_raw(&path, &Parameter::all()).await?;
    println!(
        "{} observations ({} rows rejected)",
        import.series.len(),
        import.rejected_rows
    );

    let (matrix, summary) = reduce_with_summary(&import.series, true);
    println!("{:?}", summary);

    let metrics = compute_metrics(&matrix);
    for (parameter, stats) in metrics.iter() {
        println!("{:>18}: {:?}", parameter.to_string(), stats.mean);
    }
    println!("{}", SummaryReport::new(None, matrix.date_bounds(), metrics));

    for (date, aqi) in matrix.dates().iter().zip(matrix.pm_aqi()) {
        let index = aqi.map_or("-".to_string(), |a| format!("{a:.0}"));
        println!("{} {:>6} {}", date, index, AqiCategory::describe(aqi));
    }
    Ok(())
}
