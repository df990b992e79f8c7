// Shape header: four big-endian u16 fields.

use crate::config::TableShape;
use crate::error::{IbltError, Result};

/// Encoded header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Table shape as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub bucket_count: u16,
    pub record_len: u16,
    pub digest_len: u16,
    pub hash_count: u16,
}

fn narrow(field: &'static str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| IbltError::WireOverflow {
        field,
        value: value as i64,
    })
}

impl WireHeader {
    /// Header for `shape`, failing if any field exceeds `u16`.
    pub fn from_shape(shape: &TableShape) -> Result<Self> {
        Ok(Self {
            bucket_count: narrow("bucket count", shape.bucket_count)?,
            record_len: narrow("record length", shape.record_len)?,
            digest_len: narrow("digest length", shape.digest_len)?,
            hash_count: narrow("hash count", shape.hash_count)?,
        })
    }

    pub fn shape(&self) -> TableShape {
        TableShape::new(
            self.bucket_count as usize,
            self.record_len as usize,
            self.digest_len as usize,
            self.hash_count as usize,
        )
    }

    /// Byte length of one bucket entry for this shape.
    pub fn entry_len(&self) -> usize {
        super::ENTRY_PREFIX_LEN + self.record_len as usize + self.digest_len as usize
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        for field in [
            self.bucket_count,
            self.record_len,
            self.digest_len,
            self.hash_count,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
    }

    /// Parse the header from the front of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(IbltError::MalformedWireData {
                offset: data.len(),
                reason: format!("header needs {HEADER_LEN} bytes, got {}", data.len()),
            });
        }
        let field = |i: usize| u16::from_be_bytes([data[2 * i], data[2 * i + 1]]);
        Ok(Self {
            bucket_count: field(0),
            record_len: field(1),
            digest_len: field(2),
            hash_count: field(3),
        })
    }
}
