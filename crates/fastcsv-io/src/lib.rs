//! # fastcsv-io
//!
//! I/O layer of the fastcsv workspace: memory-mapped input sources, BOM
//! detection and up-front transcoding for non-ASCII-compatible encodings,
//! and a byte-buffered async output sink.
//!
//! This crate knows nothing about CSV structure. It hands the engine a
//! contiguous byte view (UTF-8 or another ASCII-compatible encoding) and
//! accepts finished row bytes on the way out.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bom;
pub mod error;
pub mod sink;
pub mod source;

pub use bom::{Bom, PreparedInput, TextEncoding, decode_text, prepare_input};
pub use error::IoError;
pub use sink::BufferedSink;
pub use source::Source;
