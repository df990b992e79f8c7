//! Oxiblt: Invertible Bloom Lookup Tables for set reconciliation.
//!
//! A [`Table`] summarizes a multiset of fixed-length records in a fixed
//! number of XOR-combinable buckets. Subtracting two tables built from
//! related sets and decoding the result recovers their symmetric
//! difference, with cost proportional to the difference rather than the
//! sets.
//!
//! The crate provides:
//! - The table, bucket arithmetic and peeling decoder (`table`, `bucket`, `peel`)
//! - Keyed bucket indexing (`hash`)
//! - The deduplicated decode result (`diff`, `filter`)
//! - A compact binary wire format (`wire`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use oxiblt::{Table, TableShape};
//!
//! let shape = TableShape::new(120, 4, 1, 4);
//! let mut ours = Table::new(shape).unwrap();
//! let mut theirs = Table::new(shape).unwrap();
//! ours.insert(b"abcd").unwrap();
//! ours.insert(b"same").unwrap();
//! theirs.insert(b"same").unwrap();
//! theirs.insert(b"wxyz").unwrap();
//!
//! ours.subtract(&theirs).unwrap();
//! let diff = ours.decode().unwrap();
//! assert_eq!(diff.alpha(), &[b"abcd".to_vec()]);
//! assert_eq!(diff.beta(), &[b"wxyz".to_vec()]);
//! ```

mod bits;
pub mod bucket;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod hash;
pub mod io;
pub mod peel;
pub mod table;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use bucket::Bucket;
pub use config::{HashKey, TableShape};
pub use diff::Diff;
pub use error::{IbltError, Result, Side};
pub use peel::{DecodeOptions, ExpectedCounts};
pub use table::Table;
