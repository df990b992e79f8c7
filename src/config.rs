// Table shape parameters, hash key material and sizing defaults.
//
// A shape is validated once when a table is built; everything downstream
// (indexer, buckets, wire header) relies on the checked values.

use crate::error::{IbltError, Result};

/// Default number of buckets each record maps into.
pub const DEFAULT_HASH_COUNT: usize = 4;

/// Default truncated digest length in bytes.
pub const DEFAULT_DIGEST_LEN: usize = 1;

/// SipHash output is 64 bits, so digests cannot be longer.
pub const MAX_DIGEST_LEN: usize = 8;

/// Buckets allotted per expected difference by [`TableShape::for_expected_diff`].
pub const BUCKETS_PER_DIFF: usize = 4;

/// Indexer gives up after `INDEX_RETRY_FACTOR * bucket_count` hash attempts.
pub const INDEX_RETRY_FACTOR: usize = 32;

/// Peeling gives up after `PEEL_STEP_FACTOR * bucket_count` peeled records.
pub const PEEL_STEP_FACTOR: usize = 16;

/// Historical fixed key halves.
const DEFAULT_K0: u64 = 465;
const DEFAULT_K1: u64 = 629;

/// 128-bit key material for the keyed hash.
///
/// Both sides of a reconciliation must use the same key; tables built with
/// different keys cannot be subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub k0: u64,
    pub k1: u64,
}

impl HashKey {
    pub const fn new(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }
}

impl Default for HashKey {
    fn default() -> Self {
        Self::new(DEFAULT_K0, DEFAULT_K1)
    }
}

impl std::fmt::Display for HashKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.k0, self.k1)
    }
}

impl std::str::FromStr for HashKey {
    type Err = String;

    /// Parses `K0:K1` (decimal or `0x`-prefixed hex halves).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| format!("expected K0:K1, got '{s}'"))?;
        Ok(Self::new(parse_u64(a)?, parse_u64(b)?))
    }
}

fn parse_u64(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid key half '{s}': {e}"))
}

/// Fixed shape of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    /// Number of buckets.
    pub bucket_count: usize,
    /// Byte length of every record.
    pub record_len: usize,
    /// Byte length of the truncated hash kept per bucket.
    pub digest_len: usize,
    /// Number of distinct buckets each record maps into.
    pub hash_count: usize,
}

impl TableShape {
    pub const fn new(
        bucket_count: usize,
        record_len: usize,
        digest_len: usize,
        hash_count: usize,
    ) -> Self {
        Self {
            bucket_count,
            record_len,
            digest_len,
            hash_count,
        }
    }

    /// Shape sized for roughly `expected_diff` differing records, using the
    /// default digest length and hash count.
    pub fn for_expected_diff(expected_diff: usize, record_len: usize) -> Self {
        let bucket_count = (expected_diff.max(1) * BUCKETS_PER_DIFF).max(DEFAULT_HASH_COUNT * 2);
        Self::new(bucket_count, record_len, DEFAULT_DIGEST_LEN, DEFAULT_HASH_COUNT)
    }

    /// Check the shape is usable.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.bucket_count == 0 {
            "bucket count must be positive".to_string()
        } else if self.record_len == 0 {
            "record length must be positive".to_string()
        } else if self.digest_len == 0 || self.digest_len > MAX_DIGEST_LEN {
            format!(
                "digest length must be in 1..={MAX_DIGEST_LEN}, got {}",
                self.digest_len
            )
        } else if self.hash_count == 0 {
            "hash count must be positive".to_string()
        } else if self.bucket_count < self.hash_count {
            format!(
                "bucket count {} is smaller than hash count {}",
                self.bucket_count, self.hash_count
            )
        } else {
            return Ok(());
        };
        Err(IbltError::InvalidShape { reason })
    }

    /// Retry budget for the bucket indexer.
    pub fn index_attempt_limit(&self) -> usize {
        INDEX_RETRY_FACTOR * self.bucket_count
    }

    /// Step budget for the peeling decoder.
    pub fn peel_step_limit(&self) -> usize {
        PEEL_STEP_FACTOR * self.bucket_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_matches_historical_constants() {
        assert_eq!(HashKey::default(), HashKey::new(465, 629));
    }

    #[test]
    fn key_parse() {
        assert_eq!("1:2".parse::<HashKey>().unwrap(), HashKey::new(1, 2));
        assert_eq!(
            "0xff:0X10".parse::<HashKey>().unwrap(),
            HashKey::new(255, 16)
        );
        assert!("12".parse::<HashKey>().is_err());
        assert!("a:b".parse::<HashKey>().is_err());
    }

    #[test]
    fn validate_rejects_degenerate_shapes() {
        assert!(TableShape::new(120, 4, 1, 4).validate().is_ok());
        assert!(TableShape::new(0, 4, 1, 4).validate().is_err());
        assert!(TableShape::new(120, 0, 1, 4).validate().is_err());
        assert!(TableShape::new(120, 4, 0, 4).validate().is_err());
        assert!(TableShape::new(120, 4, 9, 4).validate().is_err());
        assert!(TableShape::new(120, 4, 1, 0).validate().is_err());
        assert!(matches!(
            TableShape::new(3, 4, 1, 4).validate(),
            Err(IbltError::InvalidShape { .. })
        ));
    }

    #[test]
    fn sizing_helper() {
        let s = TableShape::for_expected_diff(30, 4);
        assert_eq!(s.bucket_count, 120);
        assert_eq!(s.hash_count, DEFAULT_HASH_COUNT);
        assert!(s.validate().is_ok());

        let tiny = TableShape::for_expected_diff(0, 4);
        assert!(tiny.validate().is_ok());
    }
}
