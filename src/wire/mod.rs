// Binary wire format for tables.
//
// Layout (all integers big-endian):
//
//   header:  bucket_count u16 | record_len u16 | digest_len u16 | hash_count u16
//   entries: index u16 | count i16 | data_sum [record_len] | hash_sum [digest_len]
//
// Only non-empty buckets are written, in ascending index order. There is no
// version field and the hash key is not transmitted; both sides agree on it
// out of band.
//
// # Modules
//
// - `header`  — shape header encoding/decoding
// - `encoder` — table serialization
// - `decoder` — table deserialization with bounds and ordering checks

pub mod decoder;
pub mod encoder;
pub mod header;

pub use decoder::decode_table;
pub use encoder::{encode_table, encoded_len};
pub use header::{HEADER_LEN, WireHeader};

/// Bytes preceding the sums in each bucket entry (index + count).
pub const ENTRY_PREFIX_LEN: usize = 4;
