use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::info;

use crate::{
    dataset::Dataset,
    error::Result,
    loader::{DatasetLoader, LoadReport},
};

struct Inner {
    loader: DatasetLoader,
    current: RwLock<Option<Arc<Dataset>>>,
    /// Serializes loads so two refreshes never build at once.
    building: Mutex<()>,
}

/// Shared, swappable access to the loaded dataset.
///
/// Cloning is cheap and every clone sees the same dataset. Readers get an
/// `Arc<Dataset>` snapshot that stays valid across refreshes; a refresh
/// builds the new dataset completely before swapping it in.
#[derive(Clone)]
pub struct DatasetHandle {
    inner: Arc<Inner>,
}

impl DatasetHandle {
    /// A handle that loads on first use.
    pub fn new(loader: DatasetLoader) -> Self {
        Self::with_current(loader, None)
    }

    /// A handle already holding `dataset`.
    pub fn from_dataset(loader: DatasetLoader, dataset: Dataset) -> Self {
        Self::with_current(loader, Some(Arc::new(dataset)))
    }

    fn with_current(loader: DatasetLoader, current: Option<Arc<Dataset>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                current: RwLock::new(current),
                building: Mutex::new(()),
            }),
        }
    }

    #[inline] pub fn loader(&self) -> &DatasetLoader { &self.inner.loader }

    /// The dataset currently published, if any.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.inner.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loaded(&self) -> bool { self.current().is_some() }

    /// The published dataset, loading it first if nothing is published yet.
    /// Later calls return the same instance until a refresh.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.current() { return Ok(dataset) }

        let _building = self.inner.building.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited.
        if let Some(dataset) = self.current() { return Ok(dataset) }
        self.build_and_publish()
    }

    /// Rebuild the dataset from its source, bypassing any snapshot, and swap
    /// it in. Readers holding the previous `Arc` keep their view; on failure
    /// the previous dataset stays published.
    pub fn refresh(&self) -> Result<Arc<Dataset>> {
        let _building = self.inner.building.lock().unwrap_or_else(PoisonError::into_inner);
        let report = self.inner.loader.load_fresh()?;
        Ok(self.publish(report))
    }

    fn build_and_publish(&self) -> Result<Arc<Dataset>> {
        let report = self.inner.loader.load()?;
        Ok(self.publish(report))
    }

    fn publish(&self, report: LoadReport) -> Arc<Dataset> {
        let dataset = Arc::new(report.dataset);

        let previous = {
            let mut slot = self.inner.current.write().unwrap_or_else(PoisonError::into_inner);
            slot.replace(Arc::clone(&dataset))
        };
        info!(
            features = dataset.len(),
            replaced = previous.is_some(),
            diagnostics = report.diagnostics.len(),
            "published dataset"
        );
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn loader(seed: u64) -> DatasetLoader {
        DatasetLoader::new(PipelineConfig::default()
            .with_shapefile("/nonexistent/villages.shp")
            .with_seed(seed))
    }

    #[test]
    fn loads_lazily_once() {
        let handle = DatasetHandle::new(loader(1));
        assert!(!handle.is_loaded());

        let first = handle.get().unwrap();
        assert!(handle.is_loaded());
        let second = handle.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn refresh_swaps_and_old_readers_keep_their_view() {
        let handle = DatasetHandle::new(loader(2));
        let before = handle.get().unwrap();
        let clone = handle.clone();

        let after = clone.refresh().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&handle.current().unwrap(), &after));
        // Same seed, same content; the old snapshot is untouched.
        assert_eq!(*before, *after);
        assert_eq!(before.len(), after.len());
    }
}
