#![no_main]
use libfuzzer_sys::fuzz_target;
use oxiblt::Table;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let Ok(table) = Table::deserialize(data) else {
        return;
    };
    // Anything accepted re-encodes to the same bytes.
    if let Ok(again) = table.serialize() {
        assert_eq!(again, data);
    }
    let _ = table.decode();
});
