//! Fixed binary layout for learned afterstate values.
//!
//! All fields are little-endian:
//!
//! ```text
//! u64 length | length x f64 | u64 table fingerprint | u64 FNV-1a checksum
//! ```
//!
//! The checksum covers the value bytes only.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, Result, afterstates::Fnv1a};

fn checksum(values: &[f64]) -> u64 {
    let mut hasher = Fnv1a::new();
    for value in values {
        hasher.write(&value.to_le_bytes());
    }
    hasher.finish()
}

/// Write `values` bound to the table with `fingerprint`
pub fn write_values<W: Write>(mut writer: W, values: &[f64], fingerprint: u64) -> Result<()> {
    writer.write_u64::<LittleEndian>(values.len() as u64)?;
    for &value in values {
        writer.write_f64::<LittleEndian>(value)?;
    }
    writer.write_u64::<LittleEndian>(fingerprint)?;
    writer.write_u64::<LittleEndian>(checksum(values))?;
    writer.flush()?;
    Ok(())
}

/// Read values written by [`write_values`], checking them against the table
/// that will index them.
///
/// # Errors
///
/// * [`Error::ValueLengthMismatch`] if the stored length differs from
///   `expected_len`; nothing past the header is read in that case
/// * [`Error::TableFingerprintMismatch`] if the values belong to another table
/// * [`Error::ChecksumMismatch`] if the value bytes were altered
/// * [`Error::Io`] on truncated input
pub fn read_values<R: Read>(
    mut reader: R,
    expected_len: usize,
    expected_fingerprint: u64,
) -> Result<Vec<f64>> {
    let len = reader.read_u64::<LittleEndian>()?;
    if len != expected_len as u64 {
        return Err(Error::ValueLengthMismatch {
            expected: expected_len,
            found: usize::try_from(len).unwrap_or(usize::MAX),
        });
    }

    let mut values = vec![0.0; expected_len];
    reader.read_f64_into::<LittleEndian>(&mut values)?;

    let fingerprint = reader.read_u64::<LittleEndian>()?;
    if fingerprint != expected_fingerprint {
        return Err(Error::TableFingerprintMismatch {
            expected: expected_fingerprint,
            found: fingerprint,
        });
    }

    let stored = reader.read_u64::<LittleEndian>()?;
    let computed = checksum(&values);
    if stored != computed {
        return Err(Error::ChecksumMismatch {
            expected: stored,
            found: computed,
        });
    }

    Ok(values)
}

pub fn save(path: &Path, values: &[f64], fingerprint: u64) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::Io {
        operation: format!("create file {path:?}"),
        source,
    })?;
    write_values(BufWriter::new(file), values, fingerprint)?;
    log::debug!("Saved {} values to {}", values.len(), path.display());
    Ok(())
}

pub fn load(path: &Path, expected_len: usize, expected_fingerprint: u64) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|source| Error::Io {
        operation: format!("open file {path:?}"),
        source,
    })?;
    read_values(BufReader::new(file), expected_len, expected_fingerprint)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(values: &[f64], fingerprint: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_values(&mut bytes, values, fingerprint).unwrap();
        bytes
    }

    #[test]
    fn test_layout() {
        let bytes = encode(&[1.0, -0.5], 0xabcd);
        assert_eq!(bytes.len(), 8 + 2 * 8 + 8 + 8);
        assert_eq!(&bytes[..8], &2u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[24..32], &0xabcdu64.to_le_bytes());
    }

    #[test]
    fn test_read_back() {
        let values = vec![0.25, -1.0, 0.0];
        let bytes = encode(&values, 7);
        assert_eq!(read_values(Cursor::new(bytes), 3, 7).unwrap(), values);
    }

    #[test]
    fn test_length_mismatch() {
        let bytes = encode(&[0.25, -1.0, 0.0], 7);
        assert!(matches!(
            read_values(Cursor::new(bytes), 4, 7),
            Err(Error::ValueLengthMismatch {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_fingerprint_mismatch() {
        let bytes = encode(&[0.25], 7);
        assert!(matches!(
            read_values(Cursor::new(bytes), 1, 8),
            Err(Error::TableFingerprintMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupted_value_detected() {
        let mut bytes = encode(&[0.25, 0.5], 7);
        bytes[12] ^= 0x01;
        assert!(matches!(
            read_values(Cursor::new(bytes), 2, 7),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode(&[0.25, 0.5], 7);
        let result = read_values(Cursor::new(&bytes[..20]), 2, 7);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
