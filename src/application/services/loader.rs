//! Data access service: read, validate, publish.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::{Dataset, LoadError};
use crate::domain::{Catalog, SheetNames};
use crate::infrastructure::traits::WorkbookSource;

/// Turns a workbook source into a validated `Dataset`.
///
/// Reader failures and validation failures come back through the same
/// `LoadError` channel.
pub struct DataLoader {
    source: Arc<dyn WorkbookSource>,
    sheets: SheetNames,
}

impl DataLoader {
    pub fn new(source: Arc<dyn WorkbookSource>, sheets: SheetNames) -> Self {
        Self { source, sheets }
    }

    #[instrument(level = "debug", skip(self), fields(source = %self.source.describe()))]
    pub fn load(&self) -> Result<Arc<Dataset>, LoadError> {
        let workbook = self.source.read()?;
        let dataset = Dataset::from_workbook(&workbook, &self.sheets)?;
        info!(
            "loaded {} nodes and {} rules from {}",
            dataset.nodes().len(),
            dataset.rules().len(),
            self.source.describe()
        );
        Ok(Arc::new(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::MemorySource;
    use crate::util::testing::sample_workbook;

    #[test]
    fn given_missing_source_when_loading_then_single_error() {
        let loader = DataLoader::new(Arc::new(MemorySource::missing()), SheetNames::default());
        let err = loader.load().unwrap_err();
        assert_eq!(err.errors, vec!["Workbook file not found: <memory>".to_string()]);
    }

    #[test]
    fn given_valid_source_when_loading_then_returns_snapshot() {
        let loader = DataLoader::new(
            Arc::new(MemorySource::new(sample_workbook())),
            SheetNames::default(),
        );
        let dataset = loader.load().unwrap();
        assert_eq!(dataset.rules().len(), 1);
    }
}
