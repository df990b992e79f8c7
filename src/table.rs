// IBLT table: a fixed-shape bucket array plus the key that indexes it.
//
// Slots start absent (`None`) and are materialized on first touch. An
// absent slot and a touched-but-empty bucket are observably the same;
// equality and emptiness treat them alike.
//
// Lifecycle: build with `insert`/`delete`/`subtract`, then hand the table
// to `decode` (see `peel`), which consumes it.

use crate::bucket::Bucket;
use crate::config::{HashKey, TableShape};
use crate::error::{IbltError, Result};
use crate::hash::BucketIndexer;

/// Invertible Bloom Lookup Table.
#[derive(Debug, Clone)]
pub struct Table {
    shape: TableShape,
    key: HashKey,
    indexer: BucketIndexer,
    buckets: Vec<Option<Bucket>>,
}

impl Table {
    /// Empty table using the default hash key.
    pub fn new(shape: TableShape) -> Result<Self> {
        Self::with_key(shape, HashKey::default())
    }

    /// Empty table using `key` for bucket selection and digests.
    pub fn with_key(shape: TableShape, key: HashKey) -> Result<Self> {
        shape.validate()?;
        Ok(Self {
            shape,
            key,
            indexer: BucketIndexer::new(&shape, key),
            buckets: vec![None; shape.bucket_count],
        })
    }

    pub fn shape(&self) -> &TableShape {
        &self.shape
    }

    pub fn key(&self) -> HashKey {
        self.key
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn record_len(&self) -> usize {
        self.shape.record_len
    }

    pub(crate) fn indexer(&self) -> &BucketIndexer {
        &self.indexer
    }

    /// Bucket at `index`, or `None` if it was never touched.
    pub fn bucket(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index).and_then(Option::as_ref)
    }

    /// `(index, bucket)` for every materialized slot, ascending.
    pub fn buckets(&self) -> impl Iterator<Item = (usize, &Bucket)> {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (i, b)))
    }

    /// Every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets().all(|(_, b)| b.is_empty())
    }

    /// Number of non-empty buckets.
    pub fn occupied(&self) -> usize {
        self.buckets().filter(|(_, b)| !b.is_empty()).count()
    }

    /// Number of buckets that currently pass the purity check.
    pub fn pure_count(&self) -> usize {
        self.buckets().filter(|(_, b)| b.is_pure(self.key)).count()
    }

    /// Add `record` to each of its buckets.
    pub fn insert(&mut self, record: &[u8]) -> Result<()> {
        self.apply(record, true)
    }

    /// Remove `record` from each of its buckets. Deleting a record that was
    /// never inserted is allowed and leaves negative counts.
    pub fn delete(&mut self, record: &[u8]) -> Result<()> {
        self.apply(record, false)
    }

    pub(crate) fn apply(&mut self, record: &[u8], insert: bool) -> Result<()> {
        let indices = self.indexer.indices(record)?;
        self.apply_at(&indices, record, insert);
        Ok(())
    }

    /// Mutate the given slots. `indices` must come from this table's indexer.
    pub(crate) fn apply_at(&mut self, indices: &[usize], record: &[u8], insert: bool) {
        let (record_len, digest_len) = (self.shape.record_len, self.shape.digest_len);
        for &i in indices {
            let bucket = self.buckets[i].get_or_insert_with(|| Bucket::new(record_len, digest_len));
            if insert {
                bucket.put(self.key, record);
            } else {
                bucket.remove(self.key, record);
            }
        }
    }

    /// Install a decoded bucket. `index` must be in range.
    pub(crate) fn set_bucket(&mut self, index: usize, bucket: Bucket) {
        self.buckets[index] = Some(bucket);
    }

    /// `self = self - other`, bucket by bucket.
    ///
    /// Both tables must agree on shape and key.
    pub fn subtract(&mut self, other: &Table) -> Result<()> {
        self.check_compatible(other)?;
        for (mine, theirs) in self.buckets.iter_mut().zip(&other.buckets) {
            let Some(t) = theirs else { continue };
            if let Some(m) = mine.as_mut() {
                m.combine(t);
            } else {
                *mine = Some(t.negated());
            }
        }
        Ok(())
    }

    /// Non-mutating [`subtract`](Self::subtract).
    pub fn subtracted(&self, other: &Table) -> Result<Table> {
        let mut out = self.clone();
        out.subtract(other)?;
        Ok(out)
    }

    fn check_compatible(&self, other: &Table) -> Result<()> {
        let fields = [
            ("bucket count", self.shape.bucket_count, other.shape.bucket_count),
            ("record length", self.shape.record_len, other.shape.record_len),
            ("digest length", self.shape.digest_len, other.shape.digest_len),
            ("hash count", self.shape.hash_count, other.shape.hash_count),
            ("bucket array length", self.buckets.len(), other.buckets.len()),
        ];
        for (field, ours, theirs) in fields {
            if ours != theirs {
                return Err(IbltError::ShapeMismatch {
                    field,
                    ours: ours.to_string(),
                    theirs: theirs.to_string(),
                });
            }
        }
        if self.key != other.key {
            return Err(IbltError::ShapeMismatch {
                field: "hash key",
                ours: self.key.to_string(),
                theirs: other.key.to_string(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: Option<&Bucket>, b: Option<&Bucket>) -> bool {
            match (a, b) {
                (Some(x), Some(y)) => x == y,
                (Some(x), None) | (None, Some(x)) => x.is_empty(),
                (None, None) => true,
            }
        }
        self.shape == other.shape
            && self.key == other.key
            && self.buckets.len() == other.buckets.len()
            && self
                .buckets
                .iter()
                .zip(&other.buckets)
                .all(|(a, b)| same(a.as_ref(), b.as_ref()))
    }
}

impl Eq for Table {}
