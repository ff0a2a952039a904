//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod traits;
pub mod xlsx;

pub use error::{InfraError, SourceError};
pub use traits::{MemorySource, WorkbookSource};
pub use xlsx::XlsxSource;
