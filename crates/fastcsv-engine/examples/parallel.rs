//! Parallel decode and encode over a worker pool.
//!
//! # Running
//!
//! ```bash
//! cargo run --example parallel
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use fastcsv_engine::{
    BufferedSink, CsvRecord, CsvValue, DecodeOptions, Decoder, EncodeOptions, Encoder, Error,
    FieldDescriptor, FieldKind, FieldMap, ParallelConfig, ParallelEncodeConfig, Result, Source,
};

#[derive(Debug, Clone)]
struct Event {
    id: i64,
    kind: String,
    payload: String,
}

impl CsvRecord for Event {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("id", FieldKind::Int),
            FieldDescriptor::required("kind", FieldKind::String),
            FieldDescriptor::required("payload", FieldKind::String),
        ]
        }
    }

    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            id: fields.take_int("id")?,
            kind: fields.take_string("kind")?,
            payload: fields.take_string("payload")?,
        })
    }

    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("id", self.id.into()),
            ("kind", self.kind.as_str().into()),
            ("payload", self.payload.as_str().into()),
        ]
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Error> {
    tracing_subscriber::fmt::init();

    let mut data = b"id,kind,payload\n".to_vec();
    for i in 0..1_000_000 {
        data.extend_from_slice(format!("{i},click,\"x={},y={}\"\n", i % 1920, i % 1080).as_bytes());
    }
    println!("input: {} MiB", data.len() >> 20);

    // Order-preserving parallel decode
    let decoder = Decoder::new(DecodeOptions::default());
    let config = ParallelConfig::new().parallelism(8).preserve_order(true);
    let start = std::time::Instant::now();
    let events: Vec<Event> = decoder.decode_parallel(&Source::from_vec(data), &config)?;
    println!("decoded {} events in {:?}", events.len(), start.elapsed());
    assert_eq!(events.last().unwrap().id, 999_999);

    // Parallel encode through a buffered sink
    let dir = std::env::temp_dir().join("fastcsv-parallel-example.csv");
    let mut sink = BufferedSink::create(&dir).await?;
    let encoder = Encoder::new(EncodeOptions::default());
    let start = std::time::Instant::now();
    encoder
        .encode_parallel(
            &events,
            &ParallelEncodeConfig::new().parallelism(8),
            &mut sink,
        )
        .await?;
    sink.close().await?;
    println!("encoded to {} in {:?}", dir.display(), start.elapsed());

    Ok(())
}
