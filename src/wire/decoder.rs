// Table deserialization.
//
// Every malformation is reported with the byte offset where it was found:
// short header, unusable shape, trailing partial entry, bucket index out
// of range or not strictly ascending, or an entry for an empty bucket.

use log::debug;

use crate::bucket::Bucket;
use crate::config::HashKey;
use crate::error::{IbltError, Result};
use crate::table::Table;

use super::header::{HEADER_LEN, WireHeader};

fn malformed(offset: usize, reason: impl Into<String>) -> IbltError {
    IbltError::MalformedWireData {
        offset,
        reason: reason.into(),
    }
}

/// Rebuild a table from its wire form, indexing with `key`.
pub fn decode_table(data: &[u8], key: HashKey) -> Result<Table> {
    let header = WireHeader::decode(data)?;
    let shape = header.shape();
    let mut table = Table::with_key(shape, key).map_err(|e| match e {
        IbltError::InvalidShape { reason } => malformed(0, reason),
        other => other,
    })?;

    let entry_len = header.entry_len();
    let (record_len, digest_len) = (shape.record_len, shape.digest_len);
    let mut offset = HEADER_LEN;
    let mut last_index: Option<usize> = None;
    let mut entries = 0usize;

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < entry_len {
            return Err(malformed(
                offset,
                format!("partial bucket entry: {remaining} of {entry_len} bytes"),
            ));
        }
        let entry = &data[offset..offset + entry_len];
        let index = u16::from_be_bytes([entry[0], entry[1]]) as usize;
        let count = i16::from_be_bytes([entry[2], entry[3]]);

        if index >= shape.bucket_count {
            return Err(malformed(
                offset,
                format!("bucket index {index} out of range {}", shape.bucket_count),
            ));
        }
        if last_index.is_some_and(|prev| index <= prev) {
            return Err(malformed(offset, format!("bucket index {index} not ascending")));
        }

        let sums = &entry[super::ENTRY_PREFIX_LEN..];
        let bucket = Bucket::from_parts(
            sums[..record_len].to_vec(),
            sums[record_len..].to_vec(),
            i32::from(count),
            record_len,
            digest_len,
        )?;
        if bucket.is_empty() {
            return Err(malformed(offset, format!("bucket {index} entry is empty")));
        }
        table.set_bucket(index, bucket);

        last_index = Some(index);
        entries += 1;
        offset += entry_len;
    }

    debug!(
        "decoded table: {} buckets, {entries} entries, {} bytes",
        shape.bucket_count,
        data.len()
    );
    Ok(table)
}

impl Table {
    /// Rebuild a table serialized with the default hash key.
    pub fn deserialize(data: &[u8]) -> Result<Table> {
        decode_table(data, HashKey::default())
    }

    /// Rebuild a table serialized with `key`.
    pub fn deserialize_with_key(data: &[u8], key: HashKey) -> Result<Table> {
        decode_table(data, key)
    }
}
