//! Key canonicalization.
//!
//! Reconciliation must treat `"12,345.00"` and `"12345.00"` as the same key,
//! stay case-sensitive for textual keys, and never parse values as numbers
//! (so leading zeros and format round-trips behave predictably). Keys are
//! always text; a missing cell stays missing.

use std::sync::OnceLock;

use regex::Regex;

use crate::frame::Cell;

/// Matches strings that look like a number written with grouping or decimal
/// separators: a leading digit followed only by digits, `.` and `,`.
fn numeric_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[0-9][0-9.,]*$").expect("numeric key pattern compiles"))
}

/// Canonicalize one raw key value into its comparable form.
///
/// Missing stays missing. Otherwise the value is trimmed, interior spaces are
/// removed, and when the result looks like a separator-formatted number every
/// `.` and `,` is stripped. A whitespace-only value becomes the empty string,
/// which is a real (non-missing) key.
pub fn normalize_key(value: Option<&str>) -> Cell {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    let compact: String = trimmed.chars().filter(|c| *c != ' ').collect();
    if numeric_key_pattern().is_match(&compact) {
        Some(compact.chars().filter(|c| !matches!(c, '.' | ',')).collect())
    } else {
        Some(compact)
    }
}

pub fn normalize_cell(cell: &Cell) -> Cell {
    normalize_key(cell.as_deref())
}
