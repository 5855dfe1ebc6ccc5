//! A read-through cache for dropdown option lists.
//!
//! Filterable columns bind to option lists (warehouses, routes, salesmen)
//! that are fetched once and shared by every table in the process. The
//! cache is an explicit value handed to each table rather than an ambient
//! singleton; cloning it is cheap and clones share storage.
//!
//! [`OptionCache::ensure_loaded`] is idempotent: the first call for an
//! entity fetches through the [`OptionLoader`], later calls return the
//! cached list. Failed loads are not cached, so the next call tries again.

use crate::datasource::DataSourceError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A dropdown option: the transmitted value plus its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// The value sent in query parameters when selected.
    pub value: String,
    /// The label shown in the dropdown.
    pub label: String,
}

impl SelectOption {
    /// Creates an option from a value and label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Fetches the option list for an entity key.
#[async_trait]
pub trait OptionLoader: Send + Sync {
    /// Loads all options for `entity`, e.g. `"warehouses"`.
    async fn load(&self, entity: &str) -> Result<Vec<SelectOption>, DataSourceError>;
}

type OptionMap = HashMap<String, Arc<Vec<SelectOption>>>;

/// Shared, lazily populated option lists keyed by entity.
///
/// # Examples
///
/// ```rust
/// use bubbletea_datatable::options::{OptionCache, OptionLoader, SelectOption};
/// use bubbletea_datatable::datasource::DataSourceError;
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct WarehouseLoader;
///
/// #[async_trait]
/// impl OptionLoader for WarehouseLoader {
///     async fn load(&self, _entity: &str) -> Result<Vec<SelectOption>, DataSourceError> {
///         Ok(vec![SelectOption::new("3", "Central")])
///     }
/// }
///
/// # async fn demo() -> Result<(), DataSourceError> {
/// let cache = OptionCache::new(Arc::new(WarehouseLoader));
/// let options = cache.ensure_loaded("warehouses").await?;
/// assert_eq!(options[0].label, "Central");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OptionCache {
    loader: Arc<dyn OptionLoader>,
    entries: Arc<Mutex<OptionMap>>,
}

impl OptionCache {
    /// Creates an empty cache backed by `loader`.
    pub fn new(loader: Arc<dyn OptionLoader>) -> Self {
        Self {
            loader,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the options for `entity`, fetching them on first use.
    ///
    /// Once an entity is loaded the loader is never consulted for it
    /// again, even across clones of the cache. A failed load is returned
    /// to the caller and leaves the entity unloaded.
    pub async fn ensure_loaded(
        &self,
        entity: &str,
    ) -> Result<Arc<Vec<SelectOption>>, DataSourceError> {
        if let Some(options) = self.get(entity) {
            return Ok(options);
        }
        let loaded = Arc::new(self.loader.load(entity).await?);
        let mut entries = self.lock_entries();
        // A concurrent load may have landed first; keep whichever did.
        Ok(entries
            .entry(entity.to_string())
            .or_insert(loaded)
            .clone())
    }

    /// Returns the options for `entity` only if already loaded.
    pub fn get(&self, entity: &str) -> Option<Arc<Vec<SelectOption>>> {
        self.lock_entries().get(entity).cloned()
    }

    /// Returns `true` once `entity` has been loaded.
    pub fn is_loaded(&self, entity: &str) -> bool {
        self.lock_entries().contains_key(entity)
    }

    /// Pre-populates `entity` without consulting the loader.
    pub fn seed(&self, entity: impl Into<String>, options: Vec<SelectOption>) {
        self.lock_entries()
            .insert(entity.into(), Arc::new(options));
    }

    /// Drops the cached list for `entity`; the next
    /// [`ensure_loaded`](OptionCache::ensure_loaded) fetches anew.
    pub fn invalidate(&self, entity: &str) {
        self.lock_entries().remove(entity);
    }

    fn lock_entries(&self) -> MutexGuard<'_, OptionMap> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for OptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.lock_entries();
        f.debug_struct("OptionCache")
            .field("entities", &entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl CountingLoader {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl OptionLoader for CountingLoader {
        async fn load(&self, entity: &str) -> Result<Vec<SelectOption>, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if entity == "broken" {
                return Err(DataSourceError::Backend("unavailable".to_string()));
            }
            Ok(vec![
                SelectOption::new("1", "North"),
                SelectOption::new("3", "Central"),
            ])
        }
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let loader = CountingLoader::new();
        let cache = OptionCache::new(loader.clone());

        let first = cache.ensure_loaded("warehouses").await.expect("load");
        let second = cache.ensure_loaded("warehouses").await.expect("load");
        assert_eq!(first, second);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entities_are_cached_independently() {
        let loader = CountingLoader::new();
        let cache = OptionCache::new(loader.clone());

        cache.ensure_loaded("warehouses").await.expect("load");
        cache.ensure_loaded("routes").await.expect("load");
        cache.ensure_loaded("warehouses").await.expect("load");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let loader = CountingLoader::new();
        let cache = OptionCache::new(loader.clone());

        assert!(cache.ensure_loaded("broken").await.is_err());
        assert!(!cache.is_loaded("broken"));
        assert!(cache.ensure_loaded("broken").await.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let loader = CountingLoader::new();
        let cache = OptionCache::new(loader.clone());
        let clone = cache.clone();

        cache.ensure_loaded("warehouses").await.expect("load");
        clone.ensure_loaded("warehouses").await.expect("load");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(clone.is_loaded("warehouses"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let loader = CountingLoader::new();
        let cache = OptionCache::new(loader.clone());

        cache.ensure_loaded("warehouses").await.expect("load");
        cache.invalidate("warehouses");
        cache.ensure_loaded("warehouses").await.expect("load");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_seed_populates_without_loader() {
        let cache = OptionCache::new(CountingLoader::new());
        cache.seed("statuses", vec![SelectOption::new("1", "Active")]);
        let options = cache.get("statuses").expect("seeded");
        assert_eq!(options.len(), 1);
    }
}
