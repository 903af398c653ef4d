use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Where the files of one pipeline run live below an output root.
///
/// ```text
/// <root>/data/raw/<slug>_multi[_<date>].csv
/// <root>/data/processed/<slug>_daily[_<date>].csv
/// <root>/reports/<slug>[_<date>].txt
/// ```
///
/// # Examples
///
/// ```
/// use aq_pipeline::ArtifactPaths;
/// use chrono::NaiveDate;
/// use std::path::Path;
///
/// let stamp = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
/// let paths = ArtifactPaths::new(Path::new("out"), "milan", Some(stamp));
/// assert_eq!(paths.daily, Path::new("out/data/processed/milan_daily_2025-03-09.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw: PathBuf,
    pub daily: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: &Path, slug: &str, stamp: Option<NaiveDate>) -> Self {
        let suffix = stamp
            .map(|d| format!("_{}", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        Self {
            raw: root
                .join("data")
                .join("raw")
                .join(format!("{slug}_multi{suffix}.csv")),
            daily: root
                .join("data")
                .join("processed")
                .join(format!("{slug}_daily{suffix}.csv")),
            report: root.join("reports").join(format!("{slug}{suffix}.txt")),
        }
    }
}
