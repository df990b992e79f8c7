// Keyed hashing for bucket selection and per-bucket digests.
//
// This module provides:
// - SipHash-2-4 keyed by a `HashKey`, plain and tweaked
// - Truncated digests stored in each bucket's hash sum
// - The bucket indexer mapping a record to its `hash_count` buckets

pub mod indexer;
pub mod keyed;

pub use indexer::BucketIndexer;
pub use keyed::{digest, keyed_hash, tweaked_hash};
