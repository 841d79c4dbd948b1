//! Quote-aware chunking for parallel decode.
//!
//! A chunk boundary must satisfy two constraints: it lies on a row
//! boundary, and that row boundary is not inside a quoted field. Quote
//! parity up to any offset is fully determined by the number of `"` bytes
//! before it (RFC 4180 has no escaping outside doubled quotes), so parity
//! is carried forward incrementally and each target offset costs only the
//! bytes between it and the previous target.

use crate::QUOTE;
use crate::scan::{self, StructuralIter};

/// A row-aligned sub-range of the input assigned to one decode worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in source order.
    pub index: usize,
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset (past the row terminator).
    pub end: usize,
    /// True for the first data chunk.
    pub is_first: bool,
}

impl Chunk {
    /// Chunk length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `buf` into row-aligned chunks of roughly `chunk_size` bytes.
///
/// With `skip_header` set, the first row is consumed before chunking and
/// is not part of any chunk (callers parse it separately for header
/// resolution). An input that ends inside a quoted field produces a final
/// chunk ending at EOF; the parser reports the unterminated quote.
#[must_use]
pub fn split_chunks(
    buf: &[u8],
    delimiter: u8,
    chunk_size: usize,
    skip_header: bool,
) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let mut cursor = 0usize;
    if skip_header {
        cursor = row_boundary_from(buf, delimiter, 0, false);
    }

    let mut chunks = Vec::new();
    let mut in_quotes = false;
    let mut parity_pos = cursor;
    while cursor < buf.len() {
        let target = cursor.saturating_add(chunk_size).min(buf.len());
        let end = if target == buf.len() {
            buf.len()
        } else {
            // Carry parity up to the target, then walk structural bytes
            // forward to the first unquoted row terminator.
            let quotes = scan::count_byte(&buf[parity_pos..target], QUOTE);
            if quotes % 2 == 1 {
                in_quotes = !in_quotes;
            }
            let end = row_boundary_from(buf, delimiter, target, in_quotes);
            in_quotes = false;
            end
        };
        chunks.push(Chunk {
            index: chunks.len(),
            start: cursor,
            end,
            is_first: chunks.is_empty(),
        });
        parity_pos = end;
        cursor = end;
    }
    chunks
}

/// Starting at `from` with the given quote parity, return the offset just
/// past the first unquoted row terminator, or `buf.len()`.
fn row_boundary_from(buf: &[u8], delimiter: u8, from: usize, mut in_quotes: bool) -> usize {
    for (rel, byte) in StructuralIter::new(&buf[from..], delimiter) {
        match byte {
            QUOTE => in_quotes = !in_quotes,
            b'\n' if !in_quotes => return from + rel + 1,
            b'\r' if !in_quotes => {
                let mut end = from + rel + 1;
                if buf.get(end) == Some(&b'\n') {
                    end += 1;
                }
                return end;
            }
            _ => {}
        }
    }
    buf.len()
}
