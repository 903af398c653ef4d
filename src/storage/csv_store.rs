//! Reads and writes pipeline artifacts: the daily matrix and raw series as
//! CSV tables, the summary report as plain text.
//!
//! Polars I/O runs on the blocking thread pool.

use crate::storage::error::StorageError;
use crate::types::error::SeriesError;
use crate::types::frames::daily_matrix::DailyMatrix;
use crate::types::frames::raw_series::{RawImport, RawSeries};
use crate::types::parameter::Parameter;
use log::{debug, info};
use polars::prelude::*;
use std::io;
use std::path::Path;
use tokio::{fs, task};

/// Writes `matrix` as `date,<canonical names...>` with an empty cell for every
/// missing value. Parent directories are created as needed.
pub async fn write_daily(matrix: &DailyMatrix, path: &Path) -> Result<(), StorageError> {
    let df = matrix.to_dataframe().map_err(|e| table_error(path, e))?;
    write_csv(df, path).await?;
    info!("Wrote {} daily rows to {:?}", matrix.len(), path);
    Ok(())
}

/// Reads a table written by [`write_daily`].
pub async fn read_daily(path: &Path) -> Result<DailyMatrix, StorageError> {
    let df = read_csv(path).await?;
    DailyMatrix::from_dataframe(&df).map_err(|e| table_error(path, e))
}

/// Writes `series` in long form: `time,parameter,value,unit`.
pub async fn write_raw(series: &RawSeries, path: &Path) -> Result<(), StorageError> {
    let df = series.to_dataframe().map_err(|e| table_error(path, e))?;
    write_csv(df, path).await?;
    info!("Wrote {} raw observations to {:?}", series.len(), path);
    Ok(())
}

/// Reads a long-form raw table. `parameters` is the column shape of the
/// result and the pollutant assumed for rows of a table without a
/// `parameter` column.
pub async fn read_raw(path: &Path, parameters: &[Parameter]) -> Result<RawImport, StorageError> {
    let df = read_csv(path).await?;
    let import = RawSeries::from_dataframe(&df, parameters).map_err(|e| table_error(path, e))?;
    if import.rejected_rows > 0 {
        debug!(
            "Skipped {} unparsable rows reading {:?}",
            import.rejected_rows, path
        );
    }
    Ok(import)
}

pub async fn write_report(text: &str, path: &Path) -> Result<(), StorageError> {
    ensure_parent_dir(path).await?;
    fs::write(path, text)
        .await
        .map_err(|e| StorageError::WriteIo(path.to_path_buf(), e))?;
    info!("Wrote report to {:?}", path);
    Ok(())
}

/// Creates `path` as a directory unless it already is one.
pub async fn ensure_dir_exists(path: &Path) -> Result<(), StorageError> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(StorageError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Creating output directory {:?}", path);
            fs::create_dir_all(path)
                .await
                .map_err(|e| StorageError::DirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(StorageError::DirCreation(path.to_path_buf(), e)),
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir_exists(parent).await,
        _ => Ok(()),
    }
}

fn table_error(path: &Path, source: SeriesError) -> StorageError {
    StorageError::Table {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_csv(mut df: DataFrame, path: &Path) -> Result<(), StorageError> {
    ensure_parent_dir(path).await?;
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut file = std::fs::File::create(&path_buf)
            .map_err(|e| StorageError::WriteIo(path_buf.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| StorageError::CsvWrite(path_buf, e))?;
        Ok::<(), StorageError>(())
    })
    .await??;
    Ok(())
}

async fn read_csv(path: &Path) -> Result<DataFrame, StorageError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path_buf.clone()))
            .map_err(|e| StorageError::CsvRead(path_buf.clone(), e))?
            .finish()
            .map_err(|e| StorageError::CsvRead(path_buf, e))
    })
    .await?
}
