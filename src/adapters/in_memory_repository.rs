//! In-memory table repository for testing.
//!
//! This adapter provides a pure in-memory implementation of TableRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Result, afterstates::AfterstateTable, error::Error, ports::TableRepository};

/// In-memory repository for testing.
///
/// Stores encoded tables in a shared HashMap keyed by path.
///
/// # Examples
///
/// ```
/// use afterstate::adapters::InMemoryRepository;
/// use afterstate::afterstates::AfterstateTable;
/// use afterstate::ports::TableRepository;
/// use afterstate::tictactoe::Variant;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let table = AfterstateTable::build(Variant::Standard)?;
///
/// // Save to "memory" (not disk)
/// repo.save(&table, Path::new("standard"))?;
/// let loaded = repo.load(Path::new("standard"))?;
/// assert_eq!(loaded, table);
/// # Ok::<(), afterstate::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the number of tables currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Check if a table exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(path.to_string_lossy().as_ref())
    }
}

impl TableRepository for InMemoryRepository {
    fn save(&self, table: &AfterstateTable, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(&(table.fingerprint(), table)).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize afterstate table for in-memory storage".to_string(),
                message: e.to_string(),
            }
        })?;

        self.storage().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<AfterstateTable> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load afterstate table from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        let (fingerprint, table): (u64, AfterstateTable) =
            rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
                operation: "deserialize afterstate table from in-memory storage".to_string(),
                message: e.to_string(),
            })?;

        table.verify_fingerprint(fingerprint)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::Variant;

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let table = AfterstateTable::build(Variant::Standard).unwrap();

        let path = Path::new("standard");

        // Initially empty
        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        repo.save(&table, path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        let loaded = repo.load(path).unwrap();
        assert_eq!(loaded.fingerprint(), table.fingerprint());
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        let result = repo.load(Path::new("nonexistent"));
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();

        let table = AfterstateTable::build(Variant::Standard).unwrap();
        let path = Path::new("shared");

        repo1.save(&table, path).unwrap();

        let loaded = repo2.load(path).unwrap();
        assert_eq!(loaded.variant(), Variant::Standard);
        assert_eq!(repo2.count(), 1);
    }
}
