//! # fastcsv-scan
//!
//! Zero-copy RFC 4180 row parsing with SWAR-accelerated structural scanning.
//!
//! This crate is the pure byte-level layer of the fastcsv workspace. It
//! contains no I/O, no string decoding, and no configuration beyond the
//! delimiter byte. Higher-level crates build decoding, binding, and
//! streaming on top of it.
//!
//! ## Layers
//!
//! - [`scan`] — branch-light primitives for locating structural bytes
//!   (`"`, delimiter, `\r`, `\n`) in a buffer. Three tiers: a 64-byte
//!   unrolled stripe of 8-byte SWAR words, single 8-byte SWAR words, and a
//!   scalar tail. All tiers are semantically identical.
//! - [`RowParser`] — a single-pass iterator producing [`RowView`]s over a
//!   borrowed buffer, with full RFC 4180 quote/escape handling.
//! - [`chunk`] — quote-parity-correct splitting of a buffer into
//!   row-aligned chunks for parallel decoding.
//! - [`RowWriter`] — the inverse direction: assembling rows into a byte
//!   buffer with RFC-compliant field quoting.
//!
//! ## Example
//!
//! ```rust
//! use fastcsv_scan::RowParser;
//!
//! let mut parser = RowParser::new(b"name,age\nAlice,30\n", b',');
//! let header = parser.next_row().unwrap();
//! assert_eq!(header.field_bytes(0).unwrap().as_ref(), b"name");
//! let row = parser.next_row().unwrap();
//! assert_eq!(row.field_bytes(1).unwrap().as_ref(), b"30");
//! assert!(parser.next_row().is_none());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod parse;
pub mod row;
pub mod scan;
pub mod write;

pub use chunk::{Chunk, split_chunks};
pub use parse::RowParser;
pub use row::{FieldSpan, RowView, unescape};
pub use write::{LineTerminator, RowWriter};

/// The RFC 4180 quote byte.
pub const QUOTE: u8 = b'"';
