//! Service container for dependency injection
//!
//! Wires settings, the workbook source and the snapshot store together.

use std::sync::Arc;

use crate::application::services::{DataLoader, LoadStatus, SnapshotStore};
use crate::application::{ApplicationResult, Dataset};
use crate::config::Settings;
use crate::infrastructure::traits::WorkbookSource;
use crate::infrastructure::xlsx::XlsxSource;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Tabular reader the loader pulls from
    pub source: Arc<dyn WorkbookSource>,

    /// Currently published dataset
    pub snapshots: SnapshotStore,
}

impl ServiceContainer {
    /// Create a container reading the workbook named in `settings`.
    pub fn new(settings: Settings) -> Self {
        let source = Arc::new(XlsxSource::new(settings.workbook.clone()));
        Self::with_deps(settings, source)
    }

    /// Create a service container with a custom source (for testing).
    pub fn with_deps(settings: Settings, source: Arc<dyn WorkbookSource>) -> Self {
        Self {
            settings: Arc::new(settings),
            source,
            snapshots: SnapshotStore::new(),
        }
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new(self.source.clone(), self.settings.sheets.clone())
    }

    /// Re-read the source and publish on success.
    pub fn reload(&self) -> LoadStatus {
        self.snapshots.reload(&self.loader())
    }

    /// Published dataset, loading once if nothing has been published yet.
    pub fn dataset(&self) -> ApplicationResult<Arc<Dataset>> {
        if self.snapshots.current().is_none() {
            self.reload();
        }
        self.snapshots.require()
    }
}
