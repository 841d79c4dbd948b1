#![no_main]

use fastcsv_scan::split_chunks;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<u8>, u16)| {
    let (data, chunk_size) = input;
    // Chunks must tile the input exactly, in order
    let chunks = split_chunks(&data, b',', chunk_size as usize, false);
    let mut cursor = 0;
    for chunk in &chunks {
        assert_eq!(chunk.start, cursor);
        assert!(chunk.end <= data.len());
        cursor = chunk.end;
    }
    if !data.is_empty() {
        assert_eq!(cursor, data.len());
    }
});
