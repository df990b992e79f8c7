// Bucket indexer: record -> `hash_count` distinct bucket indices.
//
// Attempt `t` (starting at 1) hashes the record with the key's second half
// bumped by `t`, reduced modulo the bucket count. Repeated indices are
// dropped and the next counter value is tried. The modulo bias is accepted.

use crate::config::{HashKey, TableShape};
use crate::error::{IbltError, Result};

use super::keyed::tweaked_hash;

/// Deterministic record-to-buckets mapping for one table shape and key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketIndexer {
    key: HashKey,
    bucket_count: usize,
    hash_count: usize,
    record_len: usize,
    max_attempts: usize,
}

impl BucketIndexer {
    /// Indexer for a shape. The shape is not validated here, so an indexer
    /// with `bucket_count < hash_count` reports `IndexingExhausted`.
    pub fn new(shape: &TableShape, key: HashKey) -> Self {
        Self {
            key,
            bucket_count: shape.bucket_count,
            hash_count: shape.hash_count,
            record_len: shape.record_len,
            max_attempts: shape.index_attempt_limit(),
        }
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Distinct bucket indices for `record`, in ascending order.
    pub fn indices(&self, record: &[u8]) -> Result<Vec<usize>> {
        let mut out = Vec::with_capacity(self.hash_count);
        self.indices_into(record, &mut out)?;
        Ok(out)
    }

    /// Like [`indices`](Self::indices), reusing `out` as storage.
    pub fn indices_into(&self, record: &[u8], out: &mut Vec<usize>) -> Result<()> {
        if record.len() != self.record_len {
            return Err(IbltError::LengthMismatch {
                expected: self.record_len,
                actual: record.len(),
            });
        }
        out.clear();
        if self.bucket_count == 0 {
            return Err(self.exhausted(0));
        }

        let mut tries: u64 = 1;
        let mut attempts = 0usize;
        while out.len() < self.hash_count {
            if attempts >= self.max_attempts {
                return Err(self.exhausted(attempts));
            }
            attempts += 1;
            let h = tweaked_hash(self.key, tries, record);
            tries += 1;
            let idx = (h % self.bucket_count as u64) as usize;
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        out.sort_unstable();
        Ok(())
    }

    fn exhausted(&self, attempts: usize) -> IbltError {
        IbltError::IndexingExhausted {
            wanted: self.hash_count,
            buckets: self.bucket_count,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer(buckets: usize, hashes: usize) -> BucketIndexer {
        BucketIndexer::new(&TableShape::new(buckets, 4, 1, hashes), HashKey::default())
    }

    #[test]
    fn distinct_sorted_in_range() {
        let ix = indexer(1024, 4);
        let idx = ix.indices(&[131, 250, 218, 247]).unwrap();
        assert_eq!(idx.len(), 4);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        assert!(idx.iter().all(|&i| i < 1024));
    }

    #[test]
    fn deterministic_per_key() {
        let ix = indexer(120, 4);
        let rec = [1u8, 2, 3, 4];
        assert_eq!(ix.indices(&rec).unwrap(), ix.indices(&rec).unwrap());

        let other = BucketIndexer::new(&TableShape::new(120, 4, 1, 4), HashKey::new(9, 9));
        // Different keys almost surely disagree on at least one index.
        let differs = (0u8..16).any(|b| {
            let r = [b, 0, 0, 1];
            ix.indices(&r).unwrap() != other.indices(&r).unwrap()
        });
        assert!(differs);
    }

    #[test]
    fn fills_every_bucket_when_counts_equal() {
        let ix = indexer(4, 4);
        assert_eq!(ix.indices(&[9, 9, 9, 9]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn too_few_buckets_is_exhausted() {
        let ix = indexer(2, 3);
        match ix.indices(&[0, 0, 0, 0]) {
            Err(IbltError::IndexingExhausted {
                wanted, attempts, ..
            }) => {
                assert_eq!(wanted, 3);
                assert_eq!(attempts, 64);
            }
            other => panic!("expected IndexingExhausted, got {other:?}"),
        }
    }

    #[test]
    fn wrong_length_rejected() {
        let ix = indexer(120, 4);
        assert_eq!(
            ix.indices(&[1, 2, 3]),
            Err(IbltError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
