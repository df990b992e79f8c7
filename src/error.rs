// Error type shared by table construction, mutation, decoding and the wire codec.

use thiserror::Error;

/// Which half of a [`Diff`](crate::diff::Diff) an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Records with a positive net count ("extra in this table").
    Alpha,
    /// Records with a negative net count ("extra in the other table").
    Beta,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alpha => f.write_str("alpha"),
            Self::Beta => f.write_str("beta"),
        }
    }
}

/// Errors produced by the IBLT core.
///
/// Nothing is retried internally; a caller that wants e.g. a larger table
/// after `Undecodable` rebuilds it itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IbltError {
    /// Record length differs from the table's fixed record length.
    #[error("record length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Shape parameters rejected at construction time.
    #[error("invalid table shape: {reason}")]
    InvalidShape { reason: String },

    /// Two tables with different shape, key or bucket array length.
    #[error("table shape mismatch: {field} differs ({ours} vs {theirs})")]
    ShapeMismatch {
        field: &'static str,
        ours: String,
        theirs: String,
    },

    /// The indexer ran out of retries before finding enough distinct buckets.
    #[error("could not find {wanted} distinct buckets among {buckets} after {attempts} attempts")]
    IndexingExhausted {
        wanted: usize,
        buckets: usize,
        attempts: usize,
    },

    /// First peeling scan found no pure bucket in a non-empty table.
    #[error("table is undecodable: no pure buckets among {occupied} occupied")]
    Undecodable { occupied: usize },

    /// Peeling converged but buckets are left over.
    #[error("decode left {remaining} non-empty buckets")]
    ResidualEntries { remaining: usize },

    /// Peeling exceeded its step cap.
    #[error("peeling exceeded {steps} steps")]
    PeelLimitExceeded { steps: usize },

    /// Decoded record counts disagree with caller-tracked counters.
    #[error("{side} count mismatch: expected {expected}, decoded {actual}")]
    CountMismatch {
        side: Side,
        expected: usize,
        actual: usize,
    },

    /// A payload was peeled on one side while already present on the other.
    #[error("record {record:02x?} peeled as {side} but already present in the opposite set")]
    InconsistentDedup { side: Side, record: Vec<u8> },

    /// A shape value or count does not fit the wire field width.
    #[error("{field} value {value} does not fit the wire format")]
    WireOverflow { field: &'static str, value: i64 },

    /// Truncated or inconsistent serialized table.
    #[error("malformed wire data at offset {offset}: {reason}")]
    MalformedWireData { offset: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, IbltError>;
