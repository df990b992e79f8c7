// Approximate membership filters for the decode result sets.
//
// Provides a pluggable `ApproximateSet` trait and `CuckooSet`, a cuckoo
// filter that supports deletion:
//   - `insert` stores a fingerprint
//   - `contains` may report false positives, never false negatives
//   - `remove` drops one fingerprint of an earlier insert
//
// A cuckoo filter can run out of room and evict a fingerprint. Once that
// has happened `CuckooSet` answers "maybe" for everything, leaving the
// decision to the caller's exact list.

use std::collections::hash_map::DefaultHasher;

use cuckoofilter::CuckooFilter;

/// Fingerprint slots requested per expected item; keeps the table about
/// half full so cuckoo insertion rarely runs out of room.
const SLOTS_PER_ITEM: usize = 2;

/// Smallest capacity requested from the cuckoo filter.
const MIN_CAPACITY: usize = 64;

/// Approximate set over byte strings.
///
/// # Implementing a custom filter
///
/// ```no_run
/// use oxiblt::filter::ApproximateSet;
///
/// struct Everything;
///
/// impl ApproximateSet for Everything {
///     fn with_capacity(_hint: usize) -> Self { Everything }
///     fn insert(&mut self, _item: &[u8]) {}
///     fn contains(&self, _item: &[u8]) -> bool { true }
///     fn remove(&mut self, _item: &[u8]) {}
/// }
/// ```
pub trait ApproximateSet {
    /// An empty filter sized for about `hint` items.
    fn with_capacity(hint: usize) -> Self;

    fn insert(&mut self, item: &[u8]);

    /// `false` means definitely absent.
    fn contains(&self, item: &[u8]) -> bool;

    /// Undo one earlier `insert` of `item`. Removing something never
    /// inserted may introduce false negatives and is a caller bug.
    fn remove(&mut self, item: &[u8]);
}

/// Cuckoo filter over byte strings.
pub struct CuckooSet {
    filter: CuckooFilter<DefaultHasher>,
    overflowed: bool,
}

impl CuckooSet {
    /// The filter ran out of room; every lookup now answers "maybe".
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl std::fmt::Debug for CuckooSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CuckooSet")
            .field("len", &self.filter.len())
            .field("overflowed", &self.overflowed)
            .finish()
    }
}

impl ApproximateSet for CuckooSet {
    fn with_capacity(hint: usize) -> Self {
        let capacity = hint.saturating_mul(SLOTS_PER_ITEM).max(MIN_CAPACITY);
        Self {
            filter: CuckooFilter::with_capacity(capacity),
            overflowed: false,
        }
    }

    fn insert(&mut self, item: &[u8]) {
        if self.filter.add(item).is_err() {
            log::debug!("cuckoo filter full at {} items", self.filter.len());
            self.overflowed = true;
        }
    }

    fn contains(&self, item: &[u8]) -> bool {
        self.overflowed || self.filter.contains(item)
    }

    fn remove(&mut self, item: &[u8]) {
        self.filter.delete(item);
    }
}
