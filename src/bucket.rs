// XOR-combinable bucket accumulator.
//
// A bucket keeps three running sums over the records mapped to it:
//   - `data_sum`: XOR of record bytes
//   - `hash_sum`: XOR of truncated keyed digests of those records
//   - `count`:    insertions minus deletions
//
// `put` and `remove` perform the same byte mutation (XOR is its own
// inverse) and differ only in the direction of `count`.

use crate::config::HashKey;
use crate::error::{IbltError, Result};
use crate::hash::keyed::digest;

/// XOR `src` into `dst`. Lengths must match.
#[inline]
fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "xor operands differ in length");
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// One IBLT cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    data_sum: Vec<u8>,
    hash_sum: Vec<u8>,
    count: i32,
}

impl Bucket {
    /// An empty bucket with the given sum widths.
    pub fn new(record_len: usize, digest_len: usize) -> Self {
        Self {
            data_sum: vec![0; record_len],
            hash_sum: vec![0; digest_len],
            count: 0,
        }
    }

    /// Rebuild a bucket from raw parts, checking widths.
    pub fn from_parts(
        data_sum: Vec<u8>,
        hash_sum: Vec<u8>,
        count: i32,
        record_len: usize,
        digest_len: usize,
    ) -> Result<Self> {
        if data_sum.len() != record_len {
            return Err(IbltError::LengthMismatch {
                expected: record_len,
                actual: data_sum.len(),
            });
        }
        if hash_sum.len() != digest_len {
            return Err(IbltError::LengthMismatch {
                expected: digest_len,
                actual: hash_sum.len(),
            });
        }
        Ok(Self {
            data_sum,
            hash_sum,
            count,
        })
    }

    pub fn data_sum(&self) -> &[u8] {
        &self.data_sum
    }

    pub fn hash_sum(&self) -> &[u8] {
        &self.hash_sum
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    /// Fold `record` in and increment the count.
    pub fn put(&mut self, key: HashKey, record: &[u8]) {
        self.toggle(key, record);
        self.count += 1;
    }

    /// Fold `record` out and decrement the count.
    pub fn remove(&mut self, key: HashKey, record: &[u8]) {
        self.toggle(key, record);
        self.count -= 1;
    }

    fn toggle(&mut self, key: HashKey, record: &[u8]) {
        xor_in_place(&mut self.data_sum, record);
        let len = self.hash_sum.len();
        let d = digest(key, record, len);
        xor_in_place(&mut self.hash_sum, &d[..len]);
    }

    /// `self -= other`: XOR both sums in, subtract the count.
    pub fn combine(&mut self, other: &Bucket) {
        xor_in_place(&mut self.data_sum, &other.data_sum);
        xor_in_place(&mut self.hash_sum, &other.hash_sum);
        self.count -= other.count;
    }

    /// Deep copy with the count negated.
    pub fn negated(&self) -> Self {
        Self {
            data_sum: self.data_sum.clone(),
            hash_sum: self.hash_sum.clone(),
            count: -self.count,
        }
    }

    /// `|count| == 1` and the stored digest matches the digest of `data_sum`.
    ///
    /// Necessary but not sufficient for holding exactly one record.
    pub fn is_pure(&self, key: HashKey) -> bool {
        if self.count != 1 && self.count != -1 {
            return false;
        }
        let d = digest(key, &self.data_sum, self.hash_sum.len());
        self.hash_sum[..] == d[..self.hash_sum.len()]
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
            && self.data_sum.iter().all(|&b| b == 0)
            && self.hash_sum.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bucket {{ data_sum: {:02x?}, hash_sum: {:02x?}, count: {} }}",
            self.data_sum, self.hash_sum, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: HashKey = HashKey::new(465, 629);

    #[test]
    fn put_then_remove_restores() {
        let mut b = Bucket::new(4, 2);
        b.put(KEY, &[1, 2, 3, 4]);
        let before = b.clone();
        b.put(KEY, &[9, 8, 7, 6]);
        b.remove(KEY, &[9, 8, 7, 6]);
        assert_eq!(b, before);
        b.remove(KEY, &[1, 2, 3, 4]);
        assert!(b.is_empty());
    }

    #[test]
    fn single_record_is_pure_both_signs() {
        let mut b = Bucket::new(4, 1);
        b.put(KEY, &[1, 2, 3, 4]);
        assert!(b.is_pure(KEY));
        assert_eq!(b.data_sum(), &[1, 2, 3, 4]);

        let mut n = Bucket::new(4, 1);
        n.remove(KEY, &[1, 2, 3, 4]);
        assert_eq!(n.count(), -1);
        assert!(n.is_pure(KEY));
    }

    #[test]
    fn two_records_not_pure() {
        let mut b = Bucket::new(4, 8);
        b.put(KEY, &[1, 2, 3, 4]);
        b.put(KEY, &[5, 6, 7, 8]);
        assert!(!b.is_pure(KEY));
        b.remove(KEY, &[5, 6, 7, 8]);
        b.remove(KEY, &[5, 6, 7, 8]);
        // count 0 again but sums hold both records
        assert_eq!(b.count(), 0);
        assert!(!b.is_empty());
        assert!(!b.is_pure(KEY));
    }

    #[test]
    fn combine_with_self_empties() {
        let mut b = Bucket::new(3, 2);
        b.put(KEY, &[1, 1, 1]);
        b.put(KEY, &[2, 2, 2]);
        let copy = b.clone();
        b.combine(&copy);
        assert!(b.is_empty());
    }

    #[test]
    fn negated_flips_count_only() {
        let mut b = Bucket::new(2, 1);
        b.put(KEY, &[3, 4]);
        let n = b.negated();
        assert_eq!(n.count(), -1);
        assert_eq!(n.data_sum(), b.data_sum());
        assert_eq!(n.hash_sum(), b.hash_sum());
    }

    #[test]
    fn from_parts_checks_widths() {
        assert!(Bucket::from_parts(vec![0; 4], vec![0; 1], 0, 4, 1).is_ok());
        assert!(Bucket::from_parts(vec![0; 3], vec![0; 1], 0, 4, 1).is_err());
        assert!(Bucket::from_parts(vec![0; 4], vec![0; 2], 0, 4, 1).is_err());
    }
}
