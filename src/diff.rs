// Decode output: the two halves of a symmetric difference.
//
// Each half is a `ByteSet`: an approximate filter in front of an exact
// list. The filter answers most "absent" queries cheaply; a "maybe" is
// confirmed by scanning the list, so filter false positives never hide a
// record or let a duplicate in.

use crate::error::{IbltError, Result, Side};
use crate::filter::{ApproximateSet, CuckooSet};

/// Deduplicated collection of records.
#[derive(Debug, Clone)]
pub struct ByteSet<F: ApproximateSet = CuckooSet> {
    items: Vec<Vec<u8>>,
    filter: F,
}

impl<F: ApproximateSet> ByteSet<F> {
    /// Empty set whose filter is sized for about `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            filter: F::with_capacity(capacity),
        }
    }

    /// Insert unless already present. Returns whether it was added.
    pub fn insert(&mut self, record: &[u8]) -> bool {
        if self.contains(record) {
            return false;
        }
        self.filter.insert(record);
        self.items.push(record.to_vec());
        true
    }

    pub fn contains(&self, record: &[u8]) -> bool {
        self.filter.contains(record) && self.items.iter().any(|r| r == record)
    }

    /// Remove if present. Returns whether it was removed.
    pub fn delete(&mut self, record: &[u8]) -> bool {
        match self.items.iter().position(|r| r == record) {
            Some(pos) => {
                self.items.remove(pos);
                self.filter.remove(record);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records in insertion order.
    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.items.iter().map(Vec::as_slice)
    }

    pub fn into_vec(self) -> Vec<Vec<u8>> {
        self.items
    }
}

/// Symmetric difference recovered by a decode.
///
/// `alpha` holds records with a positive net count (present only in the
/// table that was subtracted from), `beta` those with a negative net count.
#[derive(Debug)]
pub struct Diff {
    alpha: ByteSet,
    beta: ByteSet,
}

impl Diff {
    /// Empty diff. `bucket_count` bounds how many records a table can yield.
    pub fn new(bucket_count: usize) -> Self {
        Self {
            alpha: ByteSet::new(bucket_count),
            beta: ByteSet::new(bucket_count),
        }
    }

    /// Record a peeled payload with its bucket count (`+1` or `-1`).
    ///
    /// A payload already present on the opposite side is retracted from
    /// there and reported as `InconsistentDedup`.
    pub(crate) fn record(&mut self, payload: &[u8], count: i32) -> Result<()> {
        let (side, mine, theirs) = if count > 0 {
            (Side::Alpha, &mut self.alpha, &mut self.beta)
        } else {
            (Side::Beta, &mut self.beta, &mut self.alpha)
        };
        if theirs.contains(payload) {
            theirs.delete(payload);
            return Err(IbltError::InconsistentDedup {
                side,
                record: payload.to_vec(),
            });
        }
        mine.insert(payload);
        Ok(())
    }

    pub fn alpha(&self) -> &[Vec<u8>] {
        self.alpha.as_slice()
    }

    pub fn beta(&self) -> &[Vec<u8>] {
        self.beta.as_slice()
    }

    pub fn alpha_len(&self) -> usize {
        self.alpha.len()
    }

    pub fn beta_len(&self) -> usize {
        self.beta.len()
    }

    pub fn contains_alpha(&self, record: &[u8]) -> bool {
        self.alpha.contains(record)
    }

    pub fn contains_beta(&self, record: &[u8]) -> bool {
        self.beta.contains(record)
    }

    /// No differences.
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty() && self.beta.is_empty()
    }

    /// `(alpha, beta)` record lists.
    pub fn into_parts(self) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
        (self.alpha.into_vec(), self.beta.into_vec())
    }
}
