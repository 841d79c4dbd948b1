#![no_main]

use fastcsv_types::{NumberStrategy, ValueParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    // Flexible number normalization must never panic
    let parser = ValueParser {
        numbers: NumberStrategy::Flexible,
        ..ValueParser::default()
    };
    let _ = parser.parse_int(text);
    let _ = parser.parse_float(text);
    let _ = parser.parse_decimal(text);
});
