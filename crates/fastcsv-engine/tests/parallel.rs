//! Parallel decode/encode integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use fastcsv_engine::{
    BufferedSink, CsvRecord, CsvValue, DecodeOptions, Decoder, EncodeOptions, Encoder,
    FieldDescriptor, FieldKind, FieldMap, ParallelConfig, ParallelEncodeConfig, Result, Source,
};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: i64,
    payload: String,
}

impl CsvRecord for Row {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("id", FieldKind::Int),
            FieldDescriptor::required("payload", FieldKind::String),
        ]
        }
    }
    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            id: fields.take_int("id")?,
            payload: fields.take_string("payload")?,
        })
    }
    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("id", self.id.into()),
            ("payload", self.payload.as_str().into()),
        ]
    }
}

fn sample_csv(rows: usize) -> Vec<u8> {
    let mut data = b"id,payload\n".to_vec();
    for i in 0..rows {
        // Quoted payloads with embedded delimiters and newlines keep the
        // chunk boundary logic honest.
        if i % 7 == 0 {
            data.extend_from_slice(format!("{i},\"multi\nline,{i}\"\n").as_bytes());
        } else {
            data.extend_from_slice(format!("{i},payload{i}\n").as_bytes());
        }
    }
    data
}

fn small_chunks(parallelism: usize, preserve_order: bool) -> ParallelConfig {
    // Bypass the builder's 64 KiB clamp to force many chunks on test-sized
    // inputs.
    ParallelConfig {
        parallelism,
        chunk_size_bytes: 512,
        preserve_order,
    }
}

#[test]
fn test_parallel_equals_sequential_with_order() {
    let data = sample_csv(5_000);
    let decoder = Decoder::new(DecodeOptions::default());
    let sequential: Vec<Row> = decoder.decode_slice(&data).unwrap();
    let parallel: Vec<Row> = decoder
        .decode_parallel(&Source::from_vec(data), &small_chunks(8, true))
        .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_unordered_same_multiset() {
    let data = sample_csv(2_000);
    let decoder = Decoder::new(DecodeOptions::default());
    let mut sequential: Vec<Row> = decoder.decode_slice(&data).unwrap();
    let mut parallel: Vec<Row> = decoder
        .decode_parallel(&Source::from_vec(data), &small_chunks(4, false))
        .unwrap();
    sequential.sort_by_key(|r| r.id);
    parallel.sort_by_key(|r| r.id);
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_single_worker() {
    let data = sample_csv(200);
    let decoder = Decoder::new(DecodeOptions::default());
    let sequential: Vec<Row> = decoder.decode_slice(&data).unwrap();
    let parallel: Vec<Row> = decoder
        .decode_parallel(&Source::from_vec(data), &small_chunks(1, true))
        .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_error_propagates() {
    let mut data = sample_csv(1_000);
    data.extend_from_slice(b"not_a_number,oops\n");
    let decoder = Decoder::new(DecodeOptions::default());
    let err = decoder
        .decode_parallel::<Row>(&Source::from_vec(data), &small_chunks(4, true))
        .unwrap_err();
    assert!(err.is_data_error());
}

#[test]
fn test_parallel_each_batches_arrive_in_chunk_order() {
    let data = sample_csv(3_000);
    let decoder = Decoder::new(DecodeOptions::default());
    let mut last_id = -1i64;
    decoder
        .decode_parallel_each::<Row, _>(
            &Source::from_vec(data),
            &small_chunks(8, true),
            |batch| {
                for row in batch {
                    assert!(row.id > last_id, "out of order: {} after {last_id}", row.id);
                    last_id = row.id;
                }
            },
        )
        .unwrap();
    assert_eq!(last_id, 2_999);
}

#[test]
fn test_parallel_headerless_input() {
    let mut data = Vec::new();
    for i in 0..500 {
        data.extend_from_slice(format!("{i},p{i}\n").as_bytes());
    }
    let options = DecodeOptions::new()
        .has_headers(false)
        .map_index(0, "id")
        .map_index(1, "payload");
    let decoder = Decoder::new(options);
    let rows: Vec<Row> = decoder
        .decode_parallel(&Source::from_vec(data), &small_chunks(4, true))
        .unwrap();
    assert_eq!(rows.len(), 500);
    assert_eq!(rows[499].id, 499);
}

// =============================================================================
// Parallel encode
// =============================================================================

fn rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| Row {
            id: i as i64,
            payload: if i % 5 == 0 {
                format!("comma,{i}")
            } else {
                format!("p{i}")
            },
        })
        .collect()
}

#[tokio::test]
async fn test_parallel_encode_matches_sequential() {
    let records = rows(4_000);
    let encoder = Encoder::new(EncodeOptions::default());
    let sequential = encoder.encode_to_vec(&records).unwrap();

    let mut sink = BufferedSink::new(Vec::new());
    encoder
        .encode_parallel(
            &records,
            &ParallelEncodeConfig::new().parallelism(4).chunk_rows(97),
            &mut sink,
        )
        .await
        .unwrap();
    sink.flush().await.unwrap();
    assert_eq!(sink.get_ref().unwrap().as_slice(), sequential.as_slice());

    let decoder = Decoder::new(DecodeOptions::default());
    let back: Vec<Row> = decoder.decode_slice(&sequential).unwrap();
    assert_eq!(back, records);
}

#[tokio::test]
async fn test_parallel_encode_empty_slice() {
    let encoder = Encoder::new(EncodeOptions::default());
    let mut sink = BufferedSink::new(Vec::new());
    encoder
        .encode_parallel::<Row, _>(&[], &ParallelEncodeConfig::default(), &mut sink)
        .await
        .unwrap();
    assert_eq!(sink.bytes_written(), 0);
}
