//! Infrastructure-level errors (wraps application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::{ApplicationError, LoadError};

/// Failure of a tabular reader to produce a workbook.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Workbook file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error loading workbook: {0}")]
    Read(String),
}

impl From<SourceError> for LoadError {
    fn from(e: SourceError) -> Self {
        LoadError::single(e.to_string())
    }
}

/// Infrastructure errors wrap application errors and add reader-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
