//! Multi-source outer join on the normalized key.

use std::collections::HashMap;

use anyhow::{Result, anyhow};

use crate::{
    frame::{Cell, Frame},
    layout,
};

/// The outer join of all projected sources on `Key`.
///
/// Series are keyed by the structured `(source label, original column name)`
/// pair, so downstream lookups never have to parse synthesized column names.
#[derive(Debug, Default)]
pub struct MergedTable {
    keys: Vec<Cell>,
    series: HashMap<(String, String), Vec<Cell>>,
}

impl MergedTable {
    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    /// One entry per distinct key value, in first-seen order across the
    /// sources. A missing key is a key value like any other here.
    pub fn keys(&self) -> &[Cell] {
        &self.keys
    }

    pub fn series(&self, source: &str, column: &str) -> Option<&[Cell]> {
        self.series
            .get(&(source.to_string(), column.to_string()))
            .map(Vec::as_slice)
    }
}

/// Fold-merge the projected sources, in configured order, via full outer join
/// on `Key`. Every key value present in at least one source appears exactly
/// once; columns of sources that lack a key are missing for that row.
pub fn merge_projected(projected: &[(String, Frame)]) -> Result<MergedTable> {
    let mut keys: Vec<Cell> = Vec::new();
    let mut slot_index: HashMap<Cell, usize> = HashMap::new();
    let mut occupancy: Vec<HashMap<usize, usize>> = Vec::with_capacity(projected.len());

    for (label, frame) in projected {
        let key_cells = frame
            .column(layout::KEY_COLUMN)
            .ok_or_else(|| anyhow!("Projection for source '{label}' is missing the key column"))?;
        let mut rows_by_slot: HashMap<usize, usize> = HashMap::new();
        for (row, key) in key_cells.iter().enumerate() {
            let slot = match slot_index.get(key) {
                Some(slot) => *slot,
                None => {
                    let slot = keys.len();
                    keys.push(key.clone());
                    slot_index.insert(key.clone(), slot);
                    slot
                }
            };
            // First occurrence wins; in-source duplicates are surfaced by the
            // duplicate-key report instead of fanning out joined rows.
            rows_by_slot.entry(slot).or_insert(row);
        }
        occupancy.push(rows_by_slot);
    }

    let mut series = HashMap::new();
    for ((label, frame), rows_by_slot) in projected.iter().zip(&occupancy) {
        for (name, cells) in frame.iter_columns() {
            if name == layout::KEY_COLUMN {
                continue;
            }
            let aligned: Vec<Cell> = (0..keys.len())
                .map(|slot| rows_by_slot.get(&slot).and_then(|row| cells[*row].clone()))
                .collect();
            series.insert((label.clone(), name.clone()), aligned);
        }
    }

    Ok(MergedTable { keys, series })
}
