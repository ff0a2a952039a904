//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// A failed load: the validator's error list, or a one-element list
/// describing why the workbook could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("data validation failed: {}", errors.join("; "))]
pub struct LoadError {
    pub errors: Vec<String>,
}

impl LoadError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("data not loaded")]
    NotLoaded { errors: Vec<String> },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Validation messages carried by a load failure, if any.
    pub fn validation_errors(&self) -> &[String] {
        match self {
            ApplicationError::Load(e) => &e.errors,
            ApplicationError::NotLoaded { errors } => errors,
            _ => &[],
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
