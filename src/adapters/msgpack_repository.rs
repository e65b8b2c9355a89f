//! MessagePack implementation of the afterstate table cache.
//!
//! This adapter implements the TableRepository port using rmp_serde for
//! compact binary serialization.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, afterstates::AfterstateTable, error::Error, ports::TableRepository};

/// MessagePack-based table cache.
///
/// The table is stored next to its fingerprint; a file whose contents no
/// longer hash to the stored fingerprint is rejected on load.
///
/// # Examples
///
/// ```no_run
/// use afterstate::adapters::MsgPackRepository;
/// use afterstate::afterstates::AfterstateTable;
/// use afterstate::ports::TableRepository;
/// use afterstate::tictactoe::Variant;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let table = AfterstateTable::build(Variant::Capture)?;
///
/// // Save table
/// repo.save(&table, Path::new("capture.table"))?;
///
/// // Load table
/// let loaded = repo.load(Path::new("capture.table"))?;
/// # Ok::<(), afterstate::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl TableRepository for MsgPackRepository {
    fn save(&self, table: &AfterstateTable, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, &(table.fingerprint(), table)).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize afterstate table to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<AfterstateTable> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        let (fingerprint, table): (u64, AfterstateTable) =
            rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
                Error::SerializationContext {
                    operation: "deserialize afterstate table from MessagePack".to_string(),
                    message: e.to_string(),
                }
            })?;

        table.validate()?;
        table.verify_fingerprint(fingerprint)?;
        Ok(table)
    }
}
