#![no_main]

use fastcsv_scan::RowParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz row parsing: must terminate and never index out of bounds
    let mut parser = RowParser::new(data, b',');
    while let Some(row) = parser.next_row() {
        for i in 0..row.len() {
            let _ = row.field_bytes(i);
        }
    }
});
