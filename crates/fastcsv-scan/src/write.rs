//! Row assembly with RFC-compliant field quoting.
//!
//! The inverse of [`crate::RowParser`]: fields arrive as pre-formatted
//! byte strings and are appended to an output buffer, quoting only the
//! fields that require it (delimiter, `"`, `\r`, or `\n` present) and
//! doubling every inner quote.

use bytes::{BufMut, BytesMut};

use crate::QUOTE;
use crate::scan;

/// Output row terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    /// `\n` (default).
    #[default]
    Lf,
    /// `\r\n`.
    CrLf,
}

impl LineTerminator {
    /// The terminator's byte representation.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Appends rows of fields to a byte buffer.
///
/// ```rust
/// use bytes::BytesMut;
/// use fastcsv_scan::{LineTerminator, RowWriter};
///
/// let writer = RowWriter::new(b',', LineTerminator::Lf);
/// let mut out = BytesMut::new();
/// writer.write_row(&mut out, [b"a,b".as_slice(), b"plain"]);
/// assert_eq!(&out[..], b"\"a,b\",plain\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RowWriter {
    delimiter: u8,
    terminator: LineTerminator,
}

impl RowWriter {
    /// Create a writer with the given delimiter and terminator.
    pub fn new(delimiter: u8, terminator: LineTerminator) -> Self {
        Self {
            delimiter,
            terminator,
        }
    }

    /// The configured delimiter byte.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Append one complete row, including the terminator.
    pub fn write_row<'f>(&self, out: &mut BytesMut, fields: impl IntoIterator<Item = &'f [u8]>) {
        let mut first = true;
        for field in fields {
            if !first {
                out.put_u8(self.delimiter);
            }
            first = false;
            self.write_field(out, field);
        }
        out.put_slice(self.terminator.as_bytes());
    }

    /// Append one field, quoting and escaping as needed.
    pub fn write_field(&self, out: &mut BytesMut, field: &[u8]) {
        if !scan::needs_quoting(field, self.delimiter) {
            out.put_slice(field);
            return;
        }
        out.reserve(field.len() + 2);
        out.put_u8(QUOTE);
        let mut rest = field;
        loop {
            let q = scan::find_quote(rest);
            out.put_slice(&rest[..q]);
            if q == rest.len() {
                break;
            }
            out.put_slice(b"\"\"");
            rest = &rest[q + 1..];
        }
        out.put_u8(QUOTE);
    }
}

impl Default for RowWriter {
    fn default() -> Self {
        Self::new(b',', LineTerminator::Lf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::RowParser;

    fn write_one(fields: &[&[u8]]) -> BytesMut {
        let writer = RowWriter::default();
        let mut out = BytesMut::new();
        writer.write_row(&mut out, fields.iter().copied());
        out
    }

    #[test]
    fn test_plain_fields_unquoted() {
        assert_eq!(&write_one(&[b"a", b"b", b"c"])[..], b"a,b,c\n");
    }

    #[test]
    fn test_escaping_seed_case() {
        let out = write_one(&[b"a,b", b"he said \"hi\"", b"line1\nline2"]);
        assert_eq!(
            &out[..],
            b"\"a,b\",\"he said \"\"hi\"\"\",\"line1\nline2\"\n"
        );
    }

    #[test]
    fn test_empty_row_is_terminator_only() {
        let writer = RowWriter::default();
        let mut out = BytesMut::new();
        writer.write_row(&mut out, std::iter::empty::<&[u8]>());
        assert_eq!(&out[..], b"\n");
    }

    #[test]
    fn test_crlf_terminator() {
        let writer = RowWriter::new(b',', LineTerminator::CrLf);
        let mut out = BytesMut::new();
        writer.write_row(&mut out, [b"a".as_slice(), b"b"]);
        assert_eq!(&out[..], b"a,b\r\n");
    }

    #[test]
    fn test_custom_delimiter_triggers_quoting() {
        let writer = RowWriter::new(b';', LineTerminator::Lf);
        let mut out = BytesMut::new();
        writer.write_row(&mut out, [b"a;b".as_slice(), b"c,d"]);
        // Comma is not structural for a `;` delimiter.
        assert_eq!(&out[..], b"\"a;b\";c,d\n");
    }

    #[test]
    fn test_quote_only_field() {
        assert_eq!(&write_one(&[b"\""])[..], b"\"\"\"\"\n");
    }

    #[test]
    fn test_roundtrip_through_parser() {
        let fields: Vec<&[u8]> = vec![b"a,b", b"he said \"hi\"", b"line1\nline2", b"", b"plain"];
        let out = write_one(&fields);
        let mut parser = RowParser::new(&out, b',');
        let row = parser.next_row().unwrap();
        assert_eq!(row.len(), fields.len());
        for (i, field) in fields.iter().enumerate() {
            assert_eq!(row.field_bytes(i).unwrap().as_ref(), *field);
        }
        assert!(parser.next_row().is_none());
    }
}
