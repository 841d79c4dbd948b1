//! RFC 4180 row parsing over a borrowed buffer.
//!
//! [`RowParser`] is a single-pass, non-restartable iterator: each call to
//! [`RowParser::next_row`] advances an internal cursor and produces one
//! [`RowView`]. The per-field state machine has two states (unquoted and
//! quoted); long unquoted fields are skipped with a structural-byte jump
//! rather than a per-byte walk.

use crate::QUOTE;
use crate::row::{FieldSpan, RowView};
use crate::scan;

/// Streaming RFC 4180 parser producing borrowed row views.
///
/// ```rust
/// use fastcsv_scan::RowParser;
///
/// let mut parser = RowParser::new(b"a,\"b,c\"\nd,e", b',');
/// let row = parser.next_row().unwrap();
/// assert_eq!(row.field_bytes(1).unwrap().as_ref(), b"b,c");
/// ```
#[derive(Debug)]
pub struct RowParser<'a> {
    buf: &'a [u8],
    delimiter: u8,
    pos: usize,
    line: u64,
}

impl<'a> RowParser<'a> {
    /// Create a parser over `buf` with the given single-byte delimiter.
    pub fn new(buf: &'a [u8], delimiter: u8) -> Self {
        Self {
            buf,
            delimiter,
            pos: 0,
            line: 1,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 1-based line number at the cursor.
    #[must_use]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// True when the input is exhausted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Parse and return the next row, or `None` at end of input.
    ///
    /// Input ending exactly on a row terminator yields no trailing empty
    /// row; a non-terminated final field yields one final row.
    pub fn next_row(&mut self) -> Option<RowView<'a>> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let mut row = RowView::new(self.buf, self.line);
        loop {
            if self.buf.get(self.pos) == Some(&QUOTE) {
                if self.parse_quoted_field(&mut row) {
                    return Some(row);
                }
            } else if self.parse_unquoted_field(&mut row) {
                return Some(row);
            }
            // A delimiter was consumed; a delimiter at end of input still
            // owes the row its final (empty) field.
            if self.pos >= self.buf.len() {
                row.push_span(FieldSpan {
                    start: self.buf.len(),
                    len: 0,
                    quoted: false,
                    has_escape: false,
                });
                return Some(row);
            }
        }
    }

    /// Parse one quoted field. Returns `true` when the row ended.
    fn parse_quoted_field(&mut self, row: &mut RowView<'a>) -> bool {
        self.pos += 1;
        let content_start = self.pos;
        let mut has_escape = false;
        loop {
            let rel = scan::find_quote(&self.buf[self.pos..]);
            let q = self.pos + rel;
            self.line += count_line_breaks(&self.buf[self.pos..q]);
            if q >= self.buf.len() {
                row.push_span(FieldSpan {
                    start: content_start,
                    len: self.buf.len() - content_start,
                    quoted: true,
                    has_escape,
                });
                row.set_unterminated_quote();
                self.pos = self.buf.len();
                return true;
            }
            if self.buf.get(q + 1) == Some(&QUOTE) {
                has_escape = true;
                self.pos = q + 2;
                continue;
            }
            row.push_span(FieldSpan {
                start: content_start,
                len: q - content_start,
                quoted: true,
                has_escape,
            });
            self.pos = q + 1;
            break;
        }
        match self.buf.get(self.pos).copied() {
            None => true,
            Some(b) if b == self.delimiter => {
                self.pos += 1;
                false
            }
            Some(b'\n') => {
                self.pos += 1;
                self.line += 1;
                true
            }
            Some(b'\r') => {
                self.pos += 1;
                if self.buf.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
                self.line += 1;
                true
            }
            Some(_) => {
                // Lenient: the next byte starts a new field, cursor stays.
                // Strict mode turns this flag into a parse error.
                row.set_stray_after_quote();
                false
            }
        }
    }

    /// Parse one unquoted field. Returns `true` when the row ended.
    fn parse_unquoted_field(&mut self, row: &mut RowView<'a>) -> bool {
        let field_start = self.pos;
        let rel = scan::find_structural(&self.buf[field_start..], self.delimiter);
        let end = field_start + rel;
        // The jump skips quotes; a literal quote inside unquoted content is
        // an RFC violation recorded on the row.
        if scan::find_quote(&self.buf[field_start..end]) != end - field_start {
            row.set_quote_in_unquoted();
        }
        row.push_span(FieldSpan {
            start: field_start,
            len: end - field_start,
            quoted: false,
            has_escape: false,
        });
        if end >= self.buf.len() {
            self.pos = self.buf.len();
            return true;
        }
        let b = self.buf[end];
        self.pos = end + 1;
        if b == b'\n' {
            self.line += 1;
            return true;
        }
        if b == b'\r' {
            if self.buf.get(self.pos) == Some(&b'\n') {
                self.pos += 1;
            }
            self.line += 1;
            return true;
        }
        // Delimiter: row continues.
        false
    }
}

impl<'a> Iterator for RowParser<'a> {
    type Item = RowView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}

/// Count line breaks inside quoted content: LF, plus CR not followed by LF.
fn count_line_breaks(buf: &[u8]) -> u64 {
    let mut n = scan::count_byte(buf, b'\n') as u64;
    let mut i = 0;
    while i < buf.len() {
        let rel = scan::find_byte(&buf[i..], b'\r');
        if rel == buf[i..].len() {
            break;
        }
        let at = i + rel;
        if buf.get(at + 1) != Some(&b'\n') {
            n += 1;
        }
        i = at + 1;
    }
    n
}
