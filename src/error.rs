use crate::fetching::error::FetchError;
use crate::storage::error::StorageError;
use crate::types::error::{DateRangeError, ParameterError, SeriesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AqPipelineError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown city '{city}'. Known: {known}")]
    UnknownCity { city: String, known: String },
}

impl AqPipelineError {
    /// The upstream source failed; other targets may still succeed.
    pub fn is_fetch(&self) -> bool {
        matches!(self, AqPipelineError::Fetch(_))
    }

    /// The request itself is invalid and would fail for every target.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            AqPipelineError::Parameter(_)
                | AqPipelineError::DateRange(_)
                | AqPipelineError::UnknownCity { .. }
        )
    }
}
