//! Published dataset snapshot with swap-on-success reloads.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::application::services::DataLoader;
use crate::application::{ApplicationError, ApplicationResult, Dataset};

/// Outcome of the most recent load attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStatus {
    pub loaded: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct State {
    snapshot: Option<Arc<Dataset>>,
    status: LoadStatus,
}

/// Holds the currently served `Dataset`.
///
/// Readers clone the `Arc` and keep using it even if a reload happens
/// meanwhile. A published dataset is never mutated; a successful reload
/// replaces the pointer, a failed one leaves it alone.
#[derive(Default)]
pub struct SnapshotStore {
    state: RwLock<State>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load through `loader` and publish the result if it validated.
    #[instrument(level = "debug", skip_all)]
    pub fn reload(&self, loader: &DataLoader) -> LoadStatus {
        let result = loader.load();
        let mut state = self.state.write();
        match result {
            Ok(dataset) => {
                info!("published new snapshot");
                state.status = LoadStatus {
                    loaded: true,
                    errors: Vec::new(),
                    warnings: dataset.warnings().to_vec(),
                };
                state.snapshot = Some(dataset);
            }
            Err(e) => {
                warn!(
                    errors = e.errors.len(),
                    kept_previous = state.snapshot.is_some(),
                    "load failed"
                );
                state.status = LoadStatus {
                    loaded: false,
                    errors: e.errors,
                    warnings: Vec::new(),
                };
            }
        }
        state.status.clone()
    }

    /// Currently published snapshot, if any load ever succeeded.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.state.read().snapshot.clone()
    }

    /// Published snapshot, or `NotLoaded` with the last recorded errors.
    pub fn require(&self) -> ApplicationResult<Arc<Dataset>> {
        let state = self.state.read();
        state
            .snapshot
            .clone()
            .ok_or_else(|| ApplicationError::NotLoaded {
                errors: state.status.errors.clone(),
            })
    }

    pub fn status(&self) -> LoadStatus {
        self.state.read().status.clone()
    }

    /// Whether the last load attempt succeeded.
    pub fn is_loaded(&self) -> bool {
        self.state.read().status.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, SheetNames, Workbook};
    use crate::infrastructure::traits::MemorySource;
    use crate::util::testing::sample_workbook;

    fn loader(source: Arc<MemorySource>) -> DataLoader {
        DataLoader::new(source, SheetNames::default())
    }

    #[test]
    fn given_no_load_when_requiring_then_not_loaded() {
        let store = SnapshotStore::new();
        assert!(matches!(
            store.require(),
            Err(ApplicationError::NotLoaded { errors }) if errors.is_empty()
        ));
        assert!(!store.is_loaded());
    }

    #[test]
    fn given_published_snapshot_when_reload_fails_then_keeps_serving_old() {
        let source = Arc::new(MemorySource::new(sample_workbook()));
        let store = SnapshotStore::new();
        assert!(store.reload(&loader(source.clone())).loaded);
        let before = store.require().unwrap();

        source.set(Some(Workbook::new()));
        let status = store.reload(&loader(source));

        assert!(!status.loaded);
        assert_eq!(status.errors.len(), 2);
        let after = store.require().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.nodes().len(), 4);
    }

    #[test]
    fn given_failed_first_load_when_requiring_then_carries_errors() {
        let store = SnapshotStore::new();
        store.reload(&loader(Arc::new(MemorySource::missing())));
        let err = store.require().unwrap_err();
        assert_eq!(
            err.validation_errors(),
            ["Workbook file not found: <memory>".to_string()]
        );
    }
}
