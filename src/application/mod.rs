//! Application layer: data access and assembly services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod dataset;
pub mod error;
pub mod error_ext;
pub mod services;

pub use dataset::Dataset;
pub use error::{ApplicationError, ApplicationResult, LoadError};
pub use error_ext::IoResultExt;
