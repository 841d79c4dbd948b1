//! Structural byte scanning primitives.
//!
//! Everything in this module is read-only over a `&[u8]` and never reads
//! past the end of the slice. The hot functions use SWAR (SIMD-within-a-
//! register) zero-byte detection over 8-byte words, unrolled into 64-byte
//! stripes so that a stripe with no structural bytes costs a single branch.
//!
//! The match word for target byte `B` in word `w` is computed over
//! `x = w ^ B*ONES` as `!(((x & LOW7) + LOW7) | x | LOW7)`: each matching
//! byte contributes exactly its high bit and nothing else (the masked add
//! cannot carry across lanes), so `trailing_zeros() / 8` is the index of
//! the first match and `count_ones()` the exact number of matches. The
//! borrow-based variant of this trick is not exact per lane and would
//! corrupt the quote-parity counts the chunk splitter relies on.

use crate::QUOTE;

const ONES: u64 = 0x0101_0101_0101_0101;
const LOW7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

/// Bytes per SWAR word.
const WORD: usize = 8;
/// Bytes per unrolled stripe.
const STRIPE: usize = 64;

#[inline]
fn broadcast(b: u8) -> u64 {
    u64::from(b) * ONES
}

/// SWAR match mask: high bit set in exactly the lanes equal to the
/// broadcast byte.
#[inline]
fn match_lanes(word: u64, splat: u64) -> u64 {
    let x = word ^ splat;
    !(((x & LOW7) + LOW7) | x | LOW7)
}

#[inline]
fn load_word(chunk: &[u8]) -> u64 {
    // chunks_exact(8) guarantees the length; the fallback arm is unreachable.
    match chunk.first_chunk::<WORD>() {
        Some(bytes) => u64::from_le_bytes(*bytes),
        None => 0,
    }
}

/// Find the first occurrence of any byte in `targets`, or `buf.len()`.
///
/// `targets` must be non-empty and at most four bytes; callers in this
/// crate pass fixed-size sets (quote; delimiter+CR+LF; all four).
#[inline]
fn find_first(buf: &[u8], targets: &[u8]) -> usize {
    let splats: [u64; 4] = {
        let mut s = [0u64; 4];
        for (i, &t) in targets.iter().enumerate() {
            s[i] = broadcast(t);
        }
        s
    };
    let n = targets.len();
    let mut i = 0;

    // 64-byte stripes: a stripe without matches is skipped on one branch.
    while i + STRIPE <= buf.len() {
        let mut masks = [0u64; STRIPE / WORD];
        let mut any = 0u64;
        for (k, chunk) in buf[i..i + STRIPE].chunks_exact(WORD).enumerate() {
            let w = load_word(chunk);
            let mut m = 0u64;
            for splat in &splats[..n] {
                m |= match_lanes(w, *splat);
            }
            masks[k] = m;
            any |= m;
        }
        if any != 0 {
            for (k, m) in masks.iter().enumerate() {
                if *m != 0 {
                    return i + k * WORD + (m.trailing_zeros() as usize) / 8;
                }
            }
        }
        i += STRIPE;
    }

    // 8-byte words.
    while i + WORD <= buf.len() {
        let w = load_word(&buf[i..i + WORD]);
        let mut m = 0u64;
        for splat in &splats[..n] {
            m |= match_lanes(w, *splat);
        }
        if m != 0 {
            return i + (m.trailing_zeros() as usize) / 8;
        }
        i += WORD;
    }

    // Scalar tail.
    while i < buf.len() {
        if targets.contains(&buf[i]) {
            return i;
        }
        i += 1;
    }
    buf.len()
}

/// Offset of the first `"` in `buf`, or `buf.len()` if none.
#[inline]
pub fn find_quote(buf: &[u8]) -> usize {
    find_first(buf, &[QUOTE])
}

/// Offset of the first delimiter, `\r`, or `\n` in `buf`, or `buf.len()`.
#[inline]
pub fn find_structural(buf: &[u8], delimiter: u8) -> usize {
    find_first(buf, &[delimiter, b'\r', b'\n'])
}

/// Offset of the first occurrence of `target`, or `buf.len()` if none.
#[inline]
pub(crate) fn find_byte(buf: &[u8], target: u8) -> usize {
    find_first(buf, &[target])
}

/// True iff `buf` contains the delimiter, `"`, `\r`, or `\n`.
///
/// This is the output-side quoting decision: a field for which this
/// returns `false` is written verbatim.
#[inline]
pub fn needs_quoting(buf: &[u8], delimiter: u8) -> bool {
    find_first(buf, &[delimiter, QUOTE, b'\r', b'\n']) != buf.len()
}

/// True iff `buf` contains a `""` bigram.
#[inline]
pub fn has_escaped_quote(buf: &[u8]) -> bool {
    let mut i = 0;
    while i < buf.len() {
        let q = find_quote(&buf[i..]);
        if q == buf[i..].len() {
            return false;
        }
        let at = i + q;
        if buf.get(at + 1) == Some(&QUOTE) {
            return true;
        }
        i = at + 1;
    }
    false
}

/// Count occurrences of `target` in `buf`.
#[inline]
pub fn count_byte(buf: &[u8], target: u8) -> usize {
    let splat = broadcast(target);
    let mut count = 0usize;
    let mut chunks = buf.chunks_exact(WORD);
    for chunk in &mut chunks {
        count += match_lanes(load_word(chunk), splat).count_ones() as usize;
    }
    count + chunks.remainder().iter().filter(|&&b| b == target).count()
}

/// Approximate row count: LF occurrences, not quote-aware.
///
/// Reserved for progress estimates. Quoted newlines inflate the result, so
/// it must never be used to size output buffers.
#[inline]
pub fn count_newlines(buf: &[u8]) -> usize {
    count_byte(buf, b'\n')
}

/// An ordered walk over every structural byte (`"`, delimiter, `\r`, `\n`)
/// in a buffer.
///
/// Used by the chunk boundary finder to carry quote parity forward without
/// visiting non-structural bytes one at a time.
#[derive(Debug)]
pub struct StructuralIter<'a> {
    buf: &'a [u8],
    delimiter: u8,
    pos: usize,
}

impl<'a> StructuralIter<'a> {
    /// Start a structural walk at the beginning of `buf`.
    pub fn new(buf: &'a [u8], delimiter: u8) -> Self {
        Self {
            buf,
            delimiter,
            pos: 0,
        }
    }
}

impl Iterator for StructuralIter<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let rel = find_first(
            &self.buf[self.pos..],
            &[QUOTE, self.delimiter, b'\r', b'\n'],
        );
        let at = self.pos + rel;
        if at >= self.buf.len() {
            self.pos = self.buf.len();
            return None;
        }
        self.pos = at + 1;
        Some((at, self.buf[at]))
    }
}
