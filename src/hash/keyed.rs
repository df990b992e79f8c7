// SipHash-2-4 keyed hashing.
//
// The same key drives two uses:
//   - `tweaked_hash`: bucket selection, with the retry counter added to k1
//   - `digest`: the per-record check value XORed into `hash_sum`

use std::hash::Hasher;

use siphasher::sip::SipHasher24;

use crate::config::{HashKey, MAX_DIGEST_LEN};

/// SipHash-2-4 of `record` under `key`.
#[inline]
pub fn keyed_hash(key: HashKey, record: &[u8]) -> u64 {
    let mut h = SipHasher24::new_with_keys(key.k0, key.k1);
    h.write(record);
    h.finish()
}

/// SipHash-2-4 of `record` with `tweak` added to the second key half.
#[inline]
pub fn tweaked_hash(key: HashKey, tweak: u64, record: &[u8]) -> u64 {
    keyed_hash(HashKey::new(key.k0, key.k1.wrapping_add(tweak)), record)
}

/// Big-endian hash of `record`, truncated to `len` bytes.
///
/// `len` must not exceed [`MAX_DIGEST_LEN`]; shapes are validated before
/// any digest is taken.
#[inline]
pub fn digest(key: HashKey, record: &[u8], len: usize) -> [u8; MAX_DIGEST_LEN] {
    debug_assert!(len <= MAX_DIGEST_LEN);
    let mut out = keyed_hash(key, record).to_be_bytes();
    out[len..].fill(0);
    out
}
