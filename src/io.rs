// File-oriented helpers: record lists in, serialized tables in and out.
//
// Record lists come in two formats:
//   - raw: the file is a concatenation of fixed-length records
//   - hex: one hex-encoded record per line; blank lines and `#` comments skipped

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::config::{HashKey, TableShape};
use crate::error::IbltError;
use crate::table::Table;

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Iblt(#[from] IbltError),
    /// A record list entry could not be parsed.
    #[error("record {index}: {reason}")]
    Record { index: usize, reason: String },
}

/// On-disk record list format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Concatenated fixed-length records.
    Raw,
    /// One hex record per line.
    #[default]
    Hex,
}

/// Summary of a table for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub shape: TableShape,
    /// Non-empty buckets.
    pub occupied: usize,
    /// Buckets currently passing the purity check.
    pub pure: usize,
    /// Serialized size in bytes.
    pub wire_len: usize,
}

impl TableStats {
    pub fn of(table: &Table) -> Self {
        Self {
            shape: *table.shape(),
            occupied: table.occupied(),
            pure: table.pure_count(),
            wire_len: crate::wire::encoded_len(table),
        }
    }
}

/// Read every record from `reader`, each exactly `record_len` bytes.
pub fn read_records<R: Read>(
    mut reader: R,
    format: RecordFormat,
    record_len: usize,
) -> Result<Vec<Vec<u8>>, IoError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    match format {
        RecordFormat::Raw => parse_raw(&buf, record_len),
        RecordFormat::Hex => parse_hex(&buf, record_len),
    }
}

fn parse_raw(buf: &[u8], record_len: usize) -> Result<Vec<Vec<u8>>, IoError> {
    if record_len == 0 || buf.len() % record_len != 0 {
        return Err(IoError::Record {
            index: buf.len() / record_len.max(1),
            reason: format!(
                "{} bytes is not a whole number of {record_len}-byte records",
                buf.len()
            ),
        });
    }
    Ok(buf.chunks_exact(record_len).map(<[u8]>::to_vec).collect())
}

fn parse_hex(buf: &[u8], record_len: usize) -> Result<Vec<Vec<u8>>, IoError> {
    let text = std::str::from_utf8(buf).map_err(|e| IoError::Record {
        index: 0,
        reason: format!("record list is not UTF-8: {e}"),
    })?;
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let index = out.len();
        let record = hex::decode(line).map_err(|e| IoError::Record {
            index,
            reason: format!("invalid hex '{line}': {e}"),
        })?;
        if record.len() != record_len {
            return Err(IoError::Record {
                index,
                reason: format!("expected {record_len} bytes, got {}", record.len()),
            });
        }
        out.push(record);
    }
    Ok(out)
}

/// Read a record list file.
pub fn read_records_file(
    path: &Path,
    format: RecordFormat,
    record_len: usize,
) -> Result<Vec<Vec<u8>>, IoError> {
    read_records(fs::File::open(path)?, format, record_len)
}

/// Build a table holding every record.
pub fn build_table<'a, I>(records: I, shape: TableShape, key: HashKey) -> Result<Table, IoError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut table = Table::with_key(shape, key)?;
    for record in records {
        table.insert(record)?;
    }
    Ok(table)
}

/// Load a serialized table.
pub fn load_table(path: &Path, key: HashKey) -> Result<Table, IoError> {
    let data = fs::read(path)?;
    Ok(Table::deserialize_with_key(&data, key)?)
}

/// Serialize `table` to `path`. Returns bytes written.
pub fn store_table(path: &Path, table: &Table) -> Result<usize, IoError> {
    let data = table.serialize()?;
    fs::write(path, &data)?;
    Ok(data.len())
}

/// Hex form of a record, as written in hex record lists.
pub fn record_hex(record: &[u8]) -> String {
    hex::encode(record)
}
