#![no_main]
use libfuzzer_sys::fuzz_target;
use oxiblt::{Table, TableShape};

const RECORD_LEN: usize = 4;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the split between the two sides.
    let body = &data[1..];
    let (ours, theirs) = body.split_at((data[0] as usize * RECORD_LEN).min(body.len()));

    let shape = TableShape::new(256, RECORD_LEN, 2, 4);
    let mut a = Table::new(shape).unwrap();
    let mut b = Table::new(shape).unwrap();
    for r in ours.chunks_exact(RECORD_LEN) {
        a.insert(r).unwrap();
    }
    for r in theirs.chunks_exact(RECORD_LEN) {
        b.insert(r).unwrap();
    }
    a.subtract(&b).unwrap();

    let bytes = a.serialize().unwrap();
    let back = Table::deserialize(&bytes).unwrap();
    assert_eq!(back, a);
    // Decoding may fail on overload or duplicates but must not panic.
    let _ = back.decode();
});
