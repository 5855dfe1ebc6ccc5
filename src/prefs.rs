//! Column layout persistence.
//!
//! A table with a layout key remembers which columns are visible and in
//! what order, nothing else. Row data is never persisted. Stores are
//! tolerant on the read side: a missing or unreadable entry simply means
//! no saved layout, and the table falls back to column defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::warn;

/// Persisted per-table layout: visible column keys in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableLayout {
    /// Keys of the visible columns, ordered as displayed.
    pub visible: Vec<String>,
}

impl TableLayout {
    /// Creates a layout from an ordered list of visible column keys.
    pub fn new(visible: Vec<String>) -> Self {
        Self { visible }
    }

    /// Returns `true` when `key` is visible in this layout.
    pub fn contains(&self, key: &str) -> bool {
        self.visible.iter().any(|k| k == key)
    }
}

/// Failures while persisting a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The layout file could not be written.
    #[error("failed to write layout: {0}")]
    Io(#[from] std::io::Error),
    /// The layout could not be encoded.
    #[error("failed to encode layout: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Keyed storage for table layouts.
pub trait LayoutStore: Send + Sync {
    /// Loads the layout saved under `key`, if any.
    fn load(&self, key: &str) -> Option<TableLayout>;

    /// Saves `layout` under `key`, replacing any previous value.
    fn save(&self, key: &str, layout: &TableLayout) -> Result<(), LayoutError>;
}

/// An in-process store, useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    entries: Mutex<HashMap<String, TableLayout>>,
}

impl MemoryLayoutStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, TableLayout>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn load(&self, key: &str) -> Option<TableLayout> {
        self.lock_entries().get(key).cloned()
    }

    fn save(&self, key: &str, layout: &TableLayout) -> Result<(), LayoutError> {
        self.lock_entries().insert(key.to_string(), layout.clone());
        Ok(())
    }
}

/// A store writing one JSON file per layout key under a directory.
///
/// # Examples
///
/// ```rust,no_run
/// use bubbletea_datatable::prefs::{FileLayoutStore, LayoutStore, TableLayout};
///
/// let store = FileLayoutStore::new("/home/user/.config/myapp/layouts");
/// let layout = TableLayout::new(vec!["invoice_no".to_string(), "customer".to_string()]);
/// store.save("invoices", &layout)?;
/// assert_eq!(store.load("invoices"), Some(layout));
/// # Ok::<(), bubbletea_datatable::prefs::LayoutError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    dir: PathBuf,
}

impl FileLayoutStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory layouts are stored under.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys become plain file names; anything that could escape the
        // directory is replaced.
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", sanitized))
    }
}

impl LayoutStore for FileLayoutStore {
    fn load(&self, key: &str) -> Option<TableLayout> {
        let path = self.path_for(key);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(layout) => Some(layout),
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable layout file");
                None
            }
        }
    }

    fn save(&self, key: &str, layout: &TableLayout) -> Result<(), LayoutError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(layout)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TableLayout {
        TableLayout::new(vec!["invoice_no".to_string(), "customer".to_string()])
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryLayoutStore::new();
        assert_eq!(store.load("invoices"), None);
        store.save("invoices", &layout()).expect("save");
        assert_eq!(store.load("invoices"), Some(layout()));
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryLayoutStore::new();
        store.save("invoices", &layout()).expect("save");
        let smaller = TableLayout::new(vec!["customer".to_string()]);
        store.save("invoices", &smaller).expect("save");
        assert_eq!(store.load("invoices"), Some(smaller));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileLayoutStore::new(dir.path().join("layouts"));
        assert_eq!(store.load("invoices"), None);
        store.save("invoices", &layout()).expect("save");
        assert_eq!(store.load("invoices"), Some(layout()));
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileLayoutStore::new(dir.path());
        store.save("invoices", &layout()).expect("save");
        fs::write(dir.path().join("invoices.json"), b"not json").expect("write");
        assert_eq!(store.load("invoices"), None);
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileLayoutStore::new(dir.path());
        store.save("../outside/key", &layout()).expect("save");
        assert_eq!(store.load("../outside/key"), Some(layout()));
        // The file stayed inside the store directory.
        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_layout_contains() {
        let l = layout();
        assert!(l.contains("customer"));
        assert!(!l.contains("status"));
    }

    #[test]
    fn test_layout_json_shape() {
        let json = serde_json::to_value(layout()).expect("encode");
        assert_eq!(
            json,
            serde_json::json!({"visible": ["invoice_no", "customer"]})
        );
    }
}
