//! Borrowed row views and field unescaping.
//!
//! A [`RowView`] describes one parsed row as spans into the backing buffer.
//! It owns nothing: field content is handed out as `Cow<[u8]>`, borrowed
//! whenever the field needs no unescaping. String decoding is the caller's
//! concern (fields may be in any ASCII-compatible encoding at this layer).

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::QUOTE;

/// One field's location within the backing buffer.
///
/// `start`/`len` describe the field *content*: past the opening quote and
/// excluding the closing quote for quoted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    /// Byte offset of the content start.
    pub start: usize,
    /// Content length in bytes (outer quotes excluded).
    pub len: usize,
    /// Whether the field was surrounded by quotes.
    pub quoted: bool,
    /// Whether the quoted content contains a `""` sequence.
    ///
    /// Always `false` for unquoted fields.
    pub has_escape: bool,
}

/// A non-owning description of one parsed row.
///
/// Valid only while the backing buffer is live; the parser that produced
/// it must not be advanced past the consumer's use of the view (enforced
/// by the borrow on the buffer, not the parser).
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    buf: &'a [u8],
    spans: SmallVec<[FieldSpan; 8]>,
    line: u64,
    unterminated_quote: bool,
    quote_in_unquoted: bool,
    stray_after_quote: bool,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(buf: &'a [u8], line: u64) -> Self {
        Self {
            buf,
            spans: SmallVec::new(),
            line,
            unterminated_quote: false,
            quote_in_unquoted: false,
            stray_after_quote: false,
        }
    }

    pub(crate) fn push_span(&mut self, span: FieldSpan) {
        debug_assert!(span.start + span.len <= self.buf.len());
        debug_assert!(span.quoted || !span.has_escape);
        self.spans.push(span);
    }

    pub(crate) fn set_unterminated_quote(&mut self) {
        self.unterminated_quote = true;
    }

    pub(crate) fn set_quote_in_unquoted(&mut self) {
        self.quote_in_unquoted = true;
    }

    pub(crate) fn set_stray_after_quote(&mut self) {
        self.stray_after_quote = true;
    }

    /// Number of fields in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True if the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// 1-based line number of the row's first byte.
    #[must_use]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The span describing field `i`, if present.
    #[must_use]
    pub fn span(&self, i: usize) -> Option<FieldSpan> {
        self.spans.get(i).copied()
    }

    /// Raw content bytes of field `i` with no unescaping applied.
    ///
    /// `None` when `i` is out of range (absent, as distinct from empty).
    #[must_use]
    pub fn raw_field(&self, i: usize) -> Option<&'a [u8]> {
        let span = self.spans.get(i)?;
        Some(&self.buf[span.start..span.start + span.len])
    }

    /// Unescaped content bytes of field `i`.
    ///
    /// Borrows for unquoted fields and for quoted fields without a `""`
    /// sequence; allocates only when escape collapsing is required.
    #[must_use]
    pub fn field_bytes(&self, i: usize) -> Option<Cow<'a, [u8]>> {
        let span = self.spans.get(i)?;
        let raw = &self.buf[span.start..span.start + span.len];
        if span.has_escape {
            Some(Cow::Owned(collapse_escapes(raw)))
        } else {
            Some(Cow::Borrowed(raw))
        }
    }

    /// True if a field's opening quote was never closed before end of input.
    ///
    /// Always fatal at the decode layer.
    #[must_use]
    pub fn unterminated_quote(&self) -> bool {
        self.unterminated_quote
    }

    /// True if an unquoted field contained a literal `"` (RFC violation;
    /// tolerated in lenient mode, an error in strict mode).
    #[must_use]
    pub fn quote_in_unquoted(&self) -> bool {
        self.quote_in_unquoted
    }

    /// True if a closing quote was followed by a byte other than the
    /// delimiter or a row terminator (tolerated in lenient mode).
    #[must_use]
    pub fn stray_after_quote(&self) -> bool {
        self.stray_after_quote
    }

    /// Iterate over all fields' unescaped content in order.
    pub fn iter_fields(&self) -> impl Iterator<Item = Cow<'a, [u8]>> + '_ {
        (0..self.len()).filter_map(|i| self.field_bytes(i))
    }
}

/// Collapse every `""` bigram in quoted field content to a single `"`.
///
/// The result is at most `inner.len()` bytes; callers on the hot path use
/// [`RowView::field_bytes`], which skips this entirely when the parser saw
/// no escape sequence.
#[must_use]
pub fn unescape(inner: &[u8]) -> Cow<'_, [u8]> {
    if !crate::scan::has_escaped_quote(inner) {
        return Cow::Borrowed(inner);
    }
    Cow::Owned(collapse_escapes(inner))
}

fn collapse_escapes(inner: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] == QUOTE && inner.get(i + 1) == Some(&QUOTE) {
            out.push(QUOTE);
            i += 2;
        } else {
            out.push(inner[i]);
            i += 1;
        }
    }
    out
}
