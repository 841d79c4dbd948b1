//! Streaming decode with backpressure and progress reporting.
//!
//! # Running
//!
//! ```bash
//! cargo run --example streaming
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use futures_util::StreamExt;

use fastcsv_engine::{
    CsvRecord, CsvValue, DecodeOptions, Decoder, Error, FieldDescriptor, FieldKind, FieldMap,
    MemoryLimit, Result, Source,
};

#[derive(Debug)]
struct Tick {
    symbol: String,
    price: f64,
}

impl CsvRecord for Tick {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("symbol", FieldKind::String),
            FieldDescriptor::required("price", FieldKind::Float),
        ]
        }
    }

    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            symbol: fields.take_string("symbol")?,
            price: fields.take_float("price")?,
        })
    }

    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("symbol", self.symbol.as_str().into()),
            ("price", self.price.into()),
        ]
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Error> {
    tracing_subscriber::fmt::init();

    // Generate a synthetic input
    let mut data = b"symbol,price\n".to_vec();
    for i in 0..100_000 {
        data.extend_from_slice(format!("SYM{},{}.{:02}\n", i % 50, i % 900, i % 100).as_bytes());
    }

    // A small budget keeps the producer parked most of the time; the
    // consumer drains in batches and wakes it at the low watermark.
    let limit = MemoryLimit::new()
        .budget_bytes(1 << 20)
        .estimated_row_bytes(128)
        .batch_size(512);

    let progress = Arc::new(|p: fastcsv_engine::Progress| {
        eprintln!(
            "decoded {} / ~{} rows ({} of {} bytes)",
            p.rows_decoded, p.estimated_total, p.bytes_processed, p.total_bytes
        );
    });

    let decoder = Decoder::new(DecodeOptions::default());
    let mut stream =
        decoder.stream_source::<Tick>(Source::from_vec(data), limit, Some(progress));

    let mut count = 0u64;
    let mut total = 0.0f64;
    while let Some(tick) = stream.next().await {
        let tick = tick?;
        count += 1;
        total += tick.price;
    }

    println!("streamed {count} ticks, mean price {:.2}", total / count as f64);
    Ok(())
}
