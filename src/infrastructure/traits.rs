//! I/O boundary traits for testability
//!
//! The loader only sees a `WorkbookSource`, so tests can hand it in-memory
//! tables instead of a spreadsheet on disk.

use parking_lot::Mutex;

use crate::domain::Workbook;
use crate::infrastructure::error::SourceError;

/// Tabular reader abstraction.
pub trait WorkbookSource: Send + Sync {
    /// Read every sheet of the source.
    fn read(&self) -> Result<Workbook, SourceError>;

    /// Human-readable location, used in logs and status output.
    fn describe(&self) -> String;
}

/// In-memory source, replaceable between reads.
#[derive(Debug, Default)]
pub struct MemorySource {
    workbook: Mutex<Option<Workbook>>,
}

impl MemorySource {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook: Mutex::new(Some(workbook)),
        }
    }

    /// A source whose reads fail as if the file were absent.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Swap in new content for subsequent reads.
    pub fn set(&self, workbook: Option<Workbook>) {
        *self.workbook.lock() = workbook;
    }
}

impl WorkbookSource for MemorySource {
    fn read(&self) -> Result<Workbook, SourceError> {
        self.workbook
            .lock()
            .clone()
            .ok_or_else(|| SourceError::NotFound(self.describe().into()))
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
