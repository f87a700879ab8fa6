//! Whitespace compaction for literal JSON comparison.
//!
//! This is not a JSON parser. Every byte in the C `isspace` set is dropped,
//! including whitespace inside string values, so two documents compare equal
//! after compaction only if they agree byte-for-byte on everything else: key
//! order, number formatting and escapes all matter.

use crate::error::CompactError;

/// Bytes removed by [`compact_json`]: space, `\t`, `\n`, `\v`, `\f`, `\r`.
#[inline]
#[must_use]
pub const fn is_json_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Copy `json` without its whitespace bytes.
///
/// Fails only when memory for the copy cannot be reserved.
pub fn compact_json(json: &str) -> Result<String, CompactError> {
    let mut out = String::new();
    out.try_reserve_exact(json.len())
        .map_err(|source| CompactError {
            requested: json.len(),
            source,
        })?;
    // Whitespace bytes are ASCII and never occur inside a multi-byte UTF-8
    // sequence, so filtering chars keeps the rest intact.
    out.extend(
        json.chars()
            .filter(|c| !(c.is_ascii() && is_json_space(*c as u8))),
    );
    Ok(out)
}

/// Byte offset of the first position where `expected` and `actual` differ,
/// or `None` when they are equal.
#[must_use]
pub fn first_difference(expected: &str, actual: &str) -> Option<usize> {
    let common = expected
        .bytes()
        .zip(actual.bytes())
        .position(|(e, a)| e != a);
    match common {
        Some(offset) => Some(offset),
        None if expected.len() == actual.len() => None,
        None => Some(expected.len().min(actual.len())),
    }
}
