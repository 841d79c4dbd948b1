//! BOM detection and up-front transcoding.
//!
//! Detection order matters: the UTF-32 LE marker begins with the UTF-16 LE
//! marker, so four-byte markers are checked before two-byte ones. After
//! preparation the parser always sees an ASCII-compatible byte stream:
//! UTF-16/32 inputs are transcoded to UTF-8 once, other encodings are
//! parsed in place and decoded per-field.

use std::borrow::Cow;

use crate::error::{IoError, Result};

/// A detected byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bom {
    /// `EF BB BF`.
    Utf8,
    /// `FF FE`.
    Utf16Le,
    /// `FE FF`.
    Utf16Be,
    /// `FF FE 00 00`.
    Utf32Le,
    /// `00 00 FE FF`.
    Utf32Be,
}

impl Bom {
    /// Marker length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Utf8 => 3,
            Self::Utf16Le | Self::Utf16Be => 2,
            Self::Utf32Le | Self::Utf32Be => 4,
        }
    }

    /// The encoding this marker implies.
    #[must_use]
    pub fn encoding(self) -> TextEncoding {
        match self {
            Self::Utf8 => TextEncoding::Utf8,
            Self::Utf16Le => TextEncoding::Utf16Le,
            Self::Utf16Be => TextEncoding::Utf16Be,
            Self::Utf32Le => TextEncoding::Utf32Le,
            Self::Utf32Be => TextEncoding::Utf32Be,
        }
    }
}

/// Source text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 (default).
    #[default]
    Utf8,
    /// UTF-16 little-endian.
    Utf16Le,
    /// UTF-16 big-endian.
    Utf16Be,
    /// UTF-32 little-endian.
    Utf32Le,
    /// UTF-32 big-endian.
    Utf32Be,
    /// ISO-8859-1.
    Latin1,
    /// Windows code page 1252.
    Windows1252,
    /// Classic Mac OS Roman.
    MacRoman,
}

impl TextEncoding {
    /// True when the delimiter, quote, and newline bytes appear verbatim in
    /// encoded text, allowing in-place parsing.
    #[must_use]
    pub fn is_ascii_compatible(self) -> bool {
        !matches!(
            self,
            Self::Utf16Le | Self::Utf16Be | Self::Utf32Le | Self::Utf32Be
        )
    }

    /// Canonical encoding name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
            Self::Latin1 => "ISO-8859-1",
            Self::Windows1252 => "windows-1252",
            Self::MacRoman => "macintosh",
        }
    }
}

/// Detect a BOM at the start of `buf`.
#[must_use]
pub fn detect_bom(buf: &[u8]) -> Option<Bom> {
    // Four-byte markers first: `FF FE 00 00` would otherwise match UTF-16 LE.
    if buf.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return Some(Bom::Utf32Le);
    }
    if buf.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return Some(Bom::Utf32Be);
    }
    if buf.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some(Bom::Utf8);
    }
    if buf.starts_with(&[0xFF, 0xFE]) {
        return Some(Bom::Utf16Le);
    }
    if buf.starts_with(&[0xFE, 0xFF]) {
        return Some(Bom::Utf16Be);
    }
    None
}

/// A source prepared for parsing.
#[derive(Debug)]
pub struct PreparedInput<'a> {
    /// Parseable bytes: the original slice past any BOM, or an owned UTF-8
    /// transcode of the whole input.
    pub bytes: Cow<'a, [u8]>,
    /// Effective encoding of `bytes` (always ASCII-compatible).
    pub encoding: TextEncoding,
    /// The marker that was stripped, if any.
    pub bom: Option<Bom>,
}

/// Strip the BOM and transcode if the effective encoding requires it.
///
/// A BOM overrides the declared encoding. The returned bytes borrow the
/// input whenever the effective encoding is ASCII-compatible.
pub fn prepare_input(buf: &[u8], declared: TextEncoding) -> Result<PreparedInput<'_>> {
    let bom = detect_bom(buf);
    let (payload, effective) = match bom {
        Some(mark) => (&buf[mark.len()..], mark.encoding()),
        None => (buf, declared),
    };
    if effective.is_ascii_compatible() {
        return Ok(PreparedInput {
            bytes: Cow::Borrowed(payload),
            encoding: effective,
            bom,
        });
    }
    let transcoded = transcode_to_utf8(payload, effective)?;
    tracing::debug!(
        from = effective.name(),
        bytes = transcoded.len(),
        "transcoded source to UTF-8"
    );
    Ok(PreparedInput {
        bytes: Cow::Owned(transcoded),
        encoding: TextEncoding::Utf8,
        bom,
    })
}

/// Transcode a whole non-ASCII-compatible input to UTF-8.
fn transcode_to_utf8(buf: &[u8], encoding: TextEncoding) -> Result<Vec<u8>> {
    match encoding {
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            if buf.len() % 2 != 0 {
                return Err(IoError::TruncatedInput {
                    encoding: encoding.name(),
                    len: buf.len(),
                });
            }
            let units = buf.chunks_exact(2).map(|pair| {
                let bytes = [pair[0], pair[1]];
                if encoding == TextEncoding::Utf16Le {
                    u16::from_le_bytes(bytes)
                } else {
                    u16::from_be_bytes(bytes)
                }
            });
            let mut out = String::with_capacity(buf.len() / 2);
            for decoded in std::char::decode_utf16(units) {
                match decoded {
                    Ok(c) => out.push(c),
                    Err(_) => {
                        return Err(IoError::InvalidText {
                            encoding: encoding.name(),
                        });
                    }
                }
            }
            Ok(out.into_bytes())
        }
        TextEncoding::Utf32Le | TextEncoding::Utf32Be => {
            if buf.len() % 4 != 0 {
                return Err(IoError::TruncatedInput {
                    encoding: encoding.name(),
                    len: buf.len(),
                });
            }
            let mut out = String::with_capacity(buf.len() / 4);
            for quad in buf.chunks_exact(4) {
                let bytes = [quad[0], quad[1], quad[2], quad[3]];
                let unit = if encoding == TextEncoding::Utf32Le {
                    u32::from_le_bytes(bytes)
                } else {
                    u32::from_be_bytes(bytes)
                };
                match char::from_u32(unit) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(IoError::InvalidText {
                            encoding: encoding.name(),
                        });
                    }
                }
            }
            Ok(out.into_bytes())
        }
        // ASCII-compatible encodings are parsed in place, never transcoded.
        _ => Ok(buf.to_vec()),
    }
}

/// Decode field bytes under an ASCII-compatible encoding.
///
/// Borrows for valid UTF-8; the single-byte encodings allocate only when
/// non-ASCII bytes are present.
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<Cow<'_, str>> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| IoError::InvalidText { encoding: "UTF-8" }),
        TextEncoding::Latin1 => Ok(encoding_rs::mem::decode_latin1(bytes)),
        TextEncoding::Windows1252 => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            Ok(text)
        }
        TextEncoding::MacRoman => {
            let (text, _, _) = encoding_rs::MACINTOSH.decode(bytes);
            Ok(text)
        }
        // Non-ASCII-compatible bytes reaching field extraction means the
        // transcode path was bypassed; do the full decode here.
        other => {
            let utf8 = transcode_to_utf8(bytes, other)?;
            match String::from_utf8(utf8) {
                Ok(text) => Ok(Cow::Owned(text)),
                Err(_) => Err(IoError::InvalidText {
                    encoding: other.name(),
                }),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_order_prefers_utf32() {
        assert_eq!(
            detect_bom(&[0xFF, 0xFE, 0x00, 0x00, 0x41]),
            Some(Bom::Utf32Le)
        );
        assert_eq!(detect_bom(&[0xFF, 0xFE, 0x41, 0x00]), Some(Bom::Utf16Le));
        assert_eq!(detect_bom(&[0x00, 0x00, 0xFE, 0xFF]), Some(Bom::Utf32Be));
        assert_eq!(detect_bom(&[0xFE, 0xFF, 0x00, 0x41]), Some(Bom::Utf16Be));
        assert_eq!(detect_bom(&[0xEF, 0xBB, 0xBF, b'a']), Some(Bom::Utf8));
        assert_eq!(detect_bom(b"name,age"), None);
        assert_eq!(detect_bom(b""), None);
    }

    #[test]
    fn test_utf8_bom_stripped_and_borrowed() {
        let input = b"\xEF\xBB\xBFname,age\nAlice,30\n";
        let prepared = prepare_input(input, TextEncoding::Utf8).unwrap();
        assert_eq!(prepared.bom, Some(Bom::Utf8));
        assert_eq!(prepared.encoding, TextEncoding::Utf8);
        assert!(matches!(prepared.bytes, Cow::Borrowed(_)));
        assert_eq!(prepared.bytes.as_ref(), b"name,age\nAlice,30\n");
    }

    #[test]
    fn test_bom_only_input_is_empty() {
        let prepared = prepare_input(b"\xEF\xBB\xBF", TextEncoding::Utf8).unwrap();
        assert!(prepared.bytes.is_empty());
    }

    #[test]
    fn test_utf16le_transcoded() {
        let mut input = vec![0xFF, 0xFE];
        for unit in "a,b\n".encode_utf16() {
            input.extend_from_slice(&unit.to_le_bytes());
        }
        let prepared = prepare_input(&input, TextEncoding::Utf8).unwrap();
        assert_eq!(prepared.encoding, TextEncoding::Utf8);
        assert_eq!(prepared.bytes.as_ref(), b"a,b\n");
    }

    #[test]
    fn test_utf16be_declared_without_bom() {
        let mut input = Vec::new();
        for unit in "x,y\n".encode_utf16() {
            input.extend_from_slice(&unit.to_be_bytes());
        }
        let prepared = prepare_input(&input, TextEncoding::Utf16Be).unwrap();
        assert_eq!(prepared.bytes.as_ref(), b"x,y\n");
    }

    #[test]
    fn test_utf32_transcoded_with_non_ascii() {
        let mut input = vec![0xFF, 0xFE, 0x00, 0x00];
        for c in "é,ü\n".chars() {
            input.extend_from_slice(&(c as u32).to_le_bytes());
        }
        let prepared = prepare_input(&input, TextEncoding::Utf8).unwrap();
        assert_eq!(prepared.bytes.as_ref(), "é,ü\n".as_bytes());
    }

    #[test]
    fn test_truncated_utf16_errors() {
        let input = [0xFF, 0xFE, 0x41];
        assert!(matches!(
            prepare_input(&input, TextEncoding::Utf8),
            Err(IoError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_unpaired_surrogate_errors() {
        let mut input = vec![0xFF, 0xFE];
        input.extend_from_slice(&0xD800u16.to_le_bytes());
        assert!(matches!(
            prepare_input(&input, TextEncoding::Utf8),
            Err(IoError::InvalidText { .. })
        ));
    }

    #[test]
    fn test_decode_text_utf8_borrows() {
        let text = decode_text(b"plain", TextEncoding::Utf8).unwrap();
        assert!(matches!(text, Cow::Borrowed("plain")));
        assert!(decode_text(&[0xFF], TextEncoding::Utf8).is_err());
    }

    #[test]
    fn test_decode_text_latin1() {
        // 0xE9 is é in ISO-8859-1.
        let text = decode_text(&[b'c', b'a', b'f', 0xE9], TextEncoding::Latin1).unwrap();
        assert_eq!(text.as_ref(), "café");
    }

    #[test]
    fn test_decode_text_windows1252() {
        // 0x93/0x94 are curly quotes in windows-1252.
        let text = decode_text(&[0x93, b'h', b'i', 0x94], TextEncoding::Windows1252).unwrap();
        assert_eq!(text.as_ref(), "\u{201c}hi\u{201d}");
    }
}
