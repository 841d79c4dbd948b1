//! # fastcsv-engine
//!
//! Streaming and parallel CSV decode/encode with typed record binding.
//!
//! This is the primary public API surface for the fastcsv workspace. It
//! ties the byte-level parser (`fastcsv-scan`), the value strategies
//! (`fastcsv-types`), and the I/O layer (`fastcsv-io`) into four
//! pipelines:
//!
//! - **Sequential decode** — [`Decoder::decode_path`] and friends parse a
//!   whole input into `Vec<T>`.
//! - **Streaming decode** — [`Decoder::stream_source`] yields records
//!   through an async [`RecordStream`] with watermark backpressure.
//! - **Parallel decode** — [`Decoder::decode_parallel`] fans quote-aware
//!   chunks across a bounded worker pool, order-preserving by default.
//! - **Streaming/parallel encode** — [`Encoder`] writes records through a
//!   buffered sink, deriving the header from the first record.
//!
//! Record types participate by implementing [`CsvRecord`]: a descriptor
//! table plus construct/destructure over a typed [`FieldMap`].
//!
//! ## Example
//!
//! ```rust
//! use fastcsv_engine::{
//!     CsvRecord, CsvValue, DecodeOptions, Decoder, EncodeOptions, Encoder, FieldDescriptor,
//!     FieldKind, FieldMap, Result,
//! };
//!
//! struct City {
//!     name: String,
//!     population: i64,
//! }
//!
//! impl CsvRecord for City {
//!     fn descriptors() -> &'static [FieldDescriptor] {
//!         const {
//!             &[
//!                 FieldDescriptor::required("name", FieldKind::String),
//!                 FieldDescriptor::required("population", FieldKind::Int),
//!             ]
//!         }
//!     }
//!     fn construct(fields: &mut FieldMap) -> Result<Self> {
//!         Ok(Self {
//!             name: fields.take_string("name")?,
//!             population: fields.take_int("population")?,
//!         })
//!     }
//!     fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
//!         vec![
//!             ("name", self.name.as_str().into()),
//!             ("population", self.population.into()),
//!         ]
//!     }
//! }
//!
//! let decoder = Decoder::new(DecodeOptions::default());
//! let cities: Vec<City> = decoder
//!     .decode_slice(b"name,population\nOslo,709037\nBergen,291940\n")
//!     .unwrap();
//! assert_eq!(cities[1].name, "Bergen");
//!
//! let encoder = Encoder::new(EncodeOptions::default());
//! let bytes = encoder.encode_to_vec(&cities).unwrap();
//! assert!(bytes.starts_with(b"name,population\n"));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bind;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod parallel;
pub mod record;
pub mod stream;

// Re-export commonly used types
pub use bind::RecordBinder;
pub use config::{
    DecodeOptions, EncodeOptions, MemoryLimit, ParallelConfig, ParallelEncodeConfig, ParseMode,
};
pub use decode::Decoder;
pub use encode::{Encoder, StreamEncoder};
pub use error::{Error, Location, Result};
pub use header::HeaderMap;
pub use record::{CsvRecord, FieldDescriptor, FieldKind, FieldMap, nested_value};
pub use stream::{Progress, ProgressFn, RecordStream};

// Re-export the strategy/value layer so callers need one import.
pub use fastcsv_io::{BufferedSink, Source, TextEncoding};
pub use fastcsv_scan::LineTerminator;
pub use fastcsv_types::{
    BoolStrategy, CsvValue, DateStrategy, KeyStrategy, LocaleStyle, NestedStrategy, NilStrategy,
    NumberStrategy,
};
