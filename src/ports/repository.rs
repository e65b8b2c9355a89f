//! Repository port for afterstate table persistence.

use std::path::Path;

use crate::{Result, afterstates::AfterstateTable};

/// Port for caching built afterstate tables.
///
/// Building a table is deterministic, so a cache is only an optimisation:
/// implementations must hand back a table identical to a fresh build.
///
/// # Examples
///
/// ```no_run
/// use afterstate::{
///     adapters::MsgPackRepository,
///     afterstates::AfterstateTable,
///     ports::TableRepository,
///     tictactoe::Variant,
/// };
/// use std::path::Path;
///
/// let repo = MsgPackRepository::new();
/// let table = AfterstateTable::build(Variant::Standard)?;
/// repo.save(&table, Path::new("standard.table"))?;
/// # Ok::<(), afterstate::Error>(())
/// ```
pub trait TableRepository {
    /// Save a table to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, table: &AfterstateTable, path: &Path) -> Result<()>;

    /// Load a table from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be decoded, or
    /// holds a table whose contents fail validation.
    fn load(&self, path: &Path) -> Result<AfterstateTable>;
}
