// Peeling decoder.
//
// Repeats until a scan finds nothing new:
//   1. Scan every bucket for pure ones. A pure bucket's payload is indexed
//      again; if the bucket's own slot is not among the payload's slots it
//      is a false pure and skipped. Slots of an accepted payload are claimed
//      so the same record is not queued twice through another of its buckets.
//   2. Drain the queue: record each payload in the diff, then undo it across
//      all of its slots (remove a +1, add back a -1).
//
// Success means every bucket ends empty. Peeling consumes the table.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::bits::BitSet;
use crate::diff::Diff;
use crate::error::{IbltError, Result, Side};
use crate::hash::BucketIndexer;
use crate::table::Table;

/// Record counts the caller tracked while building the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedCounts {
    /// Records only in the table that was subtracted from.
    pub alpha: usize,
    /// Records only in the subtracted table.
    pub beta: usize,
}

/// Decode tuning.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Fail with `CountMismatch` if the decoded sizes differ.
    pub expected: Option<ExpectedCounts>,
    /// Override the peel step cap (default: `PEEL_STEP_FACTOR * bucket_count`).
    pub max_steps: Option<usize>,
}

/// A queued pure bucket, snapshotted when it was found.
struct PureEntry {
    slot: usize,
    record: Vec<u8>,
    count: i32,
    indices: Vec<usize>,
}

impl Table {
    /// Recover the symmetric difference encoded in this table.
    pub fn decode(self) -> Result<Diff> {
        self.decode_with(&DecodeOptions::default())
    }

    /// [`decode`](Self::decode) with options.
    pub fn decode_with(mut self, opts: &DecodeOptions) -> Result<Diff> {
        let mut diff = Diff::new(self.bucket_count());
        if !self.is_empty() {
            let limit = opts
                .max_steps
                .unwrap_or_else(|| self.shape().peel_step_limit());
            peel(&mut self, &mut diff, limit)?;
        }
        if let Some(expected) = opts.expected {
            check_counts(&diff, expected)?;
        }
        Ok(diff)
    }
}

fn peel(table: &mut Table, diff: &mut Diff, limit: usize) -> Result<()> {
    let indexer = *table.indexer();
    let mut queue = VecDeque::new();

    enqueue_pure(table, &indexer, &mut queue)?;
    if queue.is_empty() {
        return Err(IbltError::Undecodable {
            occupied: table.occupied(),
        });
    }

    let mut steps = 0usize;
    let mut round = 0usize;
    while !queue.is_empty() {
        round += 1;
        let mut peeled = 0usize;
        while let Some(entry) = queue.pop_front() {
            let live = table
                .bucket(entry.slot)
                .is_some_and(|b| b.count() == entry.count && b.data_sum() == entry.record);
            if !live {
                trace!("slot {} changed since it was queued, skipping", entry.slot);
                continue;
            }
            steps += 1;
            if steps > limit {
                return Err(IbltError::PeelLimitExceeded { steps: limit });
            }
            diff.record(&entry.record, entry.count)?;
            // A +1 payload was inserted on this side: remove it. A -1 was
            // inserted on the other side: add it back.
            table.apply_at(&entry.indices, &entry.record, entry.count < 0);
            peeled += 1;
        }
        debug!("peel round {round}: {peeled} records");
        enqueue_pure(table, &indexer, &mut queue)?;
    }

    let remaining = table.occupied();
    if remaining > 0 {
        debug!("peeling stalled after {round} rounds with {remaining} buckets left");
        return Err(IbltError::ResidualEntries { remaining });
    }
    Ok(())
}

fn enqueue_pure(
    table: &Table,
    indexer: &BucketIndexer,
    queue: &mut VecDeque<PureEntry>,
) -> Result<()> {
    let key = table.key();
    let mut claimed = BitSet::new(table.bucket_count());
    let mut indices = Vec::with_capacity(indexer.hash_count());

    for (slot, bucket) in table.buckets() {
        if claimed.test(slot) || !bucket.is_pure(key) {
            continue;
        }
        indexer.indices_into(bucket.data_sum(), &mut indices)?;
        if indices.binary_search(&slot).is_err() {
            trace!("slot {slot} is a false pure, skipping");
            continue;
        }
        claimed.extend(indices.iter().copied());
        queue.push_back(PureEntry {
            slot,
            record: bucket.data_sum().to_vec(),
            count: bucket.count(),
            indices: indices.clone(),
        });
    }
    Ok(())
}

fn check_counts(diff: &Diff, expected: ExpectedCounts) -> Result<()> {
    if diff.alpha_len() != expected.alpha {
        return Err(IbltError::CountMismatch {
            side: Side::Alpha,
            expected: expected.alpha,
            actual: diff.alpha_len(),
        });
    }
    if diff.beta_len() != expected.beta {
        return Err(IbltError::CountMismatch {
            side: Side::Beta,
            expected: expected.beta,
            actual: diff.beta_len(),
        });
    }
    Ok(())
}
