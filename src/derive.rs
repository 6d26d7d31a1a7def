//! Presence and match derivation over the merged table.
//!
//! For every distinct key this produces the per-source presence flags, the
//! key verdict, each source's echoed key and comparison values, the
//! per-column match flags, and the overall row verdict, plus the structured
//! mismatch details the orchestrator logs per row.

use std::collections::HashSet;

use anyhow::Result;

use crate::{
    frame::{Cell, Frame},
    layout,
    merge::MergedTable,
};

pub const YES: &str = "yes";
pub const NO: &str = "no";

#[derive(Debug, Clone)]
pub struct MismatchDetail {
    pub key: Cell,
    pub missing_sources: Vec<String>,
    pub mismatched_columns: Vec<String>,
}

#[derive(Debug)]
pub struct Derivation {
    /// All derived columns, not yet in presentation order.
    pub frame: Frame,
    pub matches: usize,
    pub mismatches: usize,
    pub mismatch_rows: Vec<MismatchDetail>,
}

pub fn derive(
    merged: &MergedTable,
    projected: &[(String, Frame)],
    key_column: &str,
    compare_columns: &[String],
) -> Result<Derivation> {
    let row_count = merged.row_count();
    let keys = merged.keys();

    let mut frame = Frame::new();
    frame.push_column(layout::KEY_COLUMN, keys.to_vec())?;

    // Presence per source, against that source's non-missing normalized keys.
    let mut all_present = vec![true; row_count];
    let mut presence: Vec<(String, Vec<bool>)> = Vec::with_capacity(projected.len());
    for (label, projection) in projected {
        let key_set: HashSet<&str> = projection
            .column(layout::KEY_COLUMN)
            .map(|cells| cells.iter().filter_map(|cell| cell.as_deref()).collect())
            .unwrap_or_default();
        let present: Vec<bool> = keys
            .iter()
            .map(|key| key.as_deref().is_some_and(|k| key_set.contains(k)))
            .collect();
        for (acc, flag) in all_present.iter_mut().zip(&present) {
            *acc &= *flag;
        }
        frame.push_column(layout::presence_column(label), flags_to_cells(&present))?;
        presence.push((label.clone(), present));
    }
    frame.push_column(layout::MATCH_KEY_COLUMN, flags_to_cells(&all_present))?;

    // Each source's original key, echoed for reference.
    for (label, _) in projected {
        let cells = merged
            .series(label, key_column)
            .map(|series| series.to_vec())
            .unwrap_or_else(|| vec![None; row_count]);
        frame.push_column(layout::source_key_column(label), cells)?;
    }

    // Per comparison column: the per-source values and the cross-source flag.
    let mut all_columns_match = vec![true; row_count];
    let mut column_matches: Vec<(String, Vec<bool>)> = Vec::with_capacity(compare_columns.len());
    for column in compare_columns {
        let values: Vec<Vec<Cell>> = projected
            .iter()
            .map(|(label, _)| {
                merged
                    .series(label, column)
                    .map(|series| series.to_vec())
                    .unwrap_or_else(|| vec![None; row_count])
            })
            .collect();
        for ((label, _), cells) in projected.iter().zip(&values) {
            frame.push_column(layout::source_value_column(label, column), cells.clone())?;
        }
        let verdict: Vec<bool> = (0..row_count).map(|row| row_matches(&values, row)).collect();
        for (acc, flag) in all_columns_match.iter_mut().zip(&verdict) {
            *acc &= *flag;
        }
        frame.push_column(layout::match_column(column), flags_to_cells(&verdict))?;
        column_matches.push((column.clone(), verdict));
    }

    let row_match: Vec<bool> = all_present
        .iter()
        .zip(&all_columns_match)
        .map(|(present, columns)| *present && *columns)
        .collect();
    frame.push_column(layout::SOURCE_MATCH_COLUMN, flags_to_cells(&row_match))?;

    let matches = row_match.iter().filter(|matched| **matched).count();
    let mismatches = row_count - matches;

    let mut mismatch_rows = Vec::new();
    for (row, matched) in row_match.iter().enumerate() {
        if *matched {
            continue;
        }
        let missing_sources = presence
            .iter()
            .filter(|(_, present)| !present[row])
            .map(|(label, _)| label.clone())
            .collect();
        let mismatched_columns = column_matches
            .iter()
            .filter(|(_, verdict)| !verdict[row])
            .map(|(column, _)| column.clone())
            .collect();
        mismatch_rows.push(MismatchDetail {
            key: keys[row].clone(),
            missing_sources,
            mismatched_columns,
        });
    }

    Ok(Derivation {
        frame,
        matches,
        mismatches,
        mismatch_rows,
    })
}

fn flags_to_cells(flags: &[bool]) -> Vec<Cell> {
    flags
        .iter()
        .map(|flag| Some(if *flag { YES } else { NO }.to_string()))
        .collect()
}

/// A column matches when every source agrees with the first source's value,
/// or when every source is missing the value. Missing never equals missing,
/// so a first source without the value can only match through the all-missing
/// branch.
fn row_matches(values: &[Vec<Cell>], row: usize) -> bool {
    if values.iter().all(|cells| cells[row].is_none()) {
        return true;
    }
    let Some((reference, rest)) = values.split_first() else {
        return true;
    };
    rest.iter()
        .all(|cells| cells_equal(&reference[row], &cells[row]))
}

fn cells_equal(left: &Cell, right: &Cell) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
