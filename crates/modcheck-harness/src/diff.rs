//! Diff rendering for literal comparisons.

use modcheck_core::compact::first_difference;

/// Bytes of context shown on each side of the first difference.
const CONTEXT: usize = 24;

/// Render where `actual` first departs from `expected`.
///
/// Both inputs are expected to be compacted single-line JSON, so the diff
/// is a window around the first differing byte rather than a line diff.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    let Some(offset) = first_difference(expected, actual) else {
        return String::from("[identical]");
    };

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    out.push_str(&format!("@@ byte {offset} @@\n"));
    out.push_str(&format!("-{}\n", window(expected, offset)));
    out.push_str(&format!("+{}\n", window(actual, offset)));
    out
}

fn window(text: &str, offset: usize) -> String {
    let start = floor_boundary(text, offset.saturating_sub(CONTEXT));
    let end = ceil_boundary(text, offset.saturating_add(CONTEXT));
    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(&text[start..end]);
    if end < text.len() {
        out.push_str("...");
    }
    out
}

fn floor_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
