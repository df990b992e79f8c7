// Table serialization.

use crate::error::{IbltError, Result};
use crate::table::Table;

use super::header::{HEADER_LEN, WireHeader};

/// Exact serialized size of `table`.
pub fn encoded_len(table: &Table) -> usize {
    let shape = table.shape();
    let entry = super::ENTRY_PREFIX_LEN + shape.record_len + shape.digest_len;
    HEADER_LEN + table.occupied() * entry
}

/// Append the wire form of `table` to `out`.
///
/// Fails with `WireOverflow` if the shape does not fit in `u16` fields or a
/// bucket count does not fit in `i16`; `out` is left unchanged then.
pub fn encode_table(table: &Table, out: &mut Vec<u8>) -> Result<()> {
    let header = WireHeader::from_shape(table.shape())?;
    for (_, bucket) in table.buckets() {
        if i16::try_from(bucket.count()).is_err() {
            return Err(IbltError::WireOverflow {
                field: "bucket count value",
                value: i64::from(bucket.count()),
            });
        }
    }

    out.reserve(encoded_len(table));
    header.encode(out);
    for (index, bucket) in table.buckets().filter(|(_, b)| !b.is_empty()) {
        // Both narrowings were checked above.
        out.extend_from_slice(&(index as u16).to_be_bytes());
        out.extend_from_slice(&(bucket.count() as i16).to_be_bytes());
        out.extend_from_slice(bucket.data_sum());
        out.extend_from_slice(bucket.hash_sum());
    }
    Ok(())
}

impl Table {
    /// Wire form of this table.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode_table(self, &mut out)?;
        Ok(out)
    }

    /// Append the wire form to `out`, returning the bytes added.
    pub fn serialize_into(&self, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        encode_table(self, out)?;
        Ok(out.len() - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableShape;

    #[test]
    fn empty_table_is_header_only() {
        let t = Table::new(TableShape::new(120, 4, 1, 4)).unwrap();
        assert_eq!(t.serialize().unwrap(), [0, 120, 0, 4, 0, 1, 0, 4]);
    }

    #[test]
    fn entries_layout() {
        let mut t = Table::new(TableShape::new(16, 2, 1, 1)).unwrap();
        t.delete(&[0xAB, 0xCD]).unwrap();
        let bytes = t.serialize().unwrap();
        assert_eq!(bytes.len(), encoded_len(&t));
        assert_eq!(bytes.len(), 8 + 4 + 2 + 1);

        let (index, bucket) = t.buckets().next().unwrap();
        let entry = &bytes[8..];
        assert_eq!(u16::from_be_bytes([entry[0], entry[1]]) as usize, index);
        assert_eq!(&entry[2..4], &[0xFF, 0xFF]);
        assert_eq!(&entry[4..6], &[0xAB, 0xCD]);
        assert_eq!(&entry[6..], bucket.hash_sum());
    }

    #[test]
    fn emptied_buckets_are_omitted() {
        let mut t = Table::new(TableShape::new(64, 4, 2, 3)).unwrap();
        t.insert(&[1, 2, 3, 4]).unwrap();
        t.delete(&[1, 2, 3, 4]).unwrap();
        assert_eq!(t.serialize().unwrap().len(), HEADER_LEN);
    }

    #[test]
    fn serialize_into_appends() {
        let mut t = Table::new(TableShape::new(16, 2, 1, 2)).unwrap();
        t.insert(&[1, 2]).unwrap();
        let mut out = vec![0xEE];
        let n = t.serialize_into(&mut out).unwrap();
        assert_eq!(n, encoded_len(&t));
        assert_eq!(out[0], 0xEE);
        assert_eq!(&out[1..], t.serialize().unwrap());
    }

    #[test]
    fn count_overflow_rejected() {
        let mut t = Table::new(TableShape::new(4, 1, 1, 4)).unwrap();
        for _ in 0..=i16::MAX as usize {
            t.insert(&[7]).unwrap();
        }
        assert!(matches!(
            t.serialize(),
            Err(IbltError::WireOverflow {
                field: "bucket count value",
                ..
            })
        ));
    }
}
