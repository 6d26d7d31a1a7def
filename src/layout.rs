//! Output column naming and ordering.
//!
//! Every synthesized column name in the reconciled view is constructed here,
//! and only here; the rest of the pipeline works with structured
//! `(source, column)` lookups and never parses these names back apart.

use anyhow::Result;

use crate::frame::Frame;

/// The shared normalized-key column.
pub const KEY_COLUMN: &str = "Key";
/// Row verdict for key presence across all sources.
pub const MATCH_KEY_COLUMN: &str = "Match_Key";
/// Overall row verdict: presence and every column match.
pub const SOURCE_MATCH_COLUMN: &str = "BronMatch";

pub fn presence_column(source: &str) -> String {
    format!("Aanwezig_{source}")
}

pub fn match_column(column: &str) -> String {
    format!("Match_{column}")
}

pub fn source_key_column(source: &str) -> String {
    format!("{source}_Key")
}

pub fn source_value_column(source: &str, column: &str) -> String {
    format!("{source}_{column}")
}

/// The fixed presentation order of the reconciled view: `Key`, the presence
/// flags in source order, `Match_Key`, `BronMatch`, each source's echoed key,
/// then per comparison column each source's values followed by that column's
/// match flag.
pub fn ordered_columns(sources: &[String], compare_columns: &[String]) -> Vec<String> {
    let mut ordered =
        Vec::with_capacity(3 + sources.len() * (2 + compare_columns.len()) + compare_columns.len());
    ordered.push(KEY_COLUMN.to_string());
    for source in sources {
        ordered.push(presence_column(source));
    }
    ordered.push(MATCH_KEY_COLUMN.to_string());
    ordered.push(SOURCE_MATCH_COLUMN.to_string());
    for source in sources {
        ordered.push(source_key_column(source));
    }
    for column in compare_columns {
        for source in sources {
            ordered.push(source_value_column(source, column));
        }
        ordered.push(match_column(column));
    }
    ordered
}

/// Rearrange a derived frame into the fixed presentation order.
pub fn arrange(frame: &Frame, sources: &[String], compare_columns: &[String]) -> Result<Frame> {
    frame.select(&ordered_columns(sources, compare_columns))
}
