//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the catalog and rule contracts.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node level: '{0}'")]
    UnknownLevel(String),

    #[error("invalid applicability weight: '{0}'")]
    InvalidWeight(String),

    #[error("applicability weight must be between 1 and 5, got {0}")]
    WeightOutOfRange(i64),

    #[error("sheet '{sheet}' row {row}: missing value for column '{column}'")]
    MissingCell {
        sheet: String,
        row: usize,
        column: String,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
