//! Per-source projection: shape one raw table down to the key column and the
//! configured comparison columns, and append the normalized `Key` column.

use anyhow::Result;
use thiserror::Error;

use crate::{
    frame::{Cell, Frame},
    layout, normalize,
};

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key column '{0}' is not present")]
    MissingColumn(String),
}

/// The normalized key cells for `frame`'s key column.
pub fn normalized_key_cells(frame: &Frame, key_column: &str) -> Result<Vec<Cell>, KeyError> {
    let cells = frame
        .column(key_column)
        .ok_or_else(|| KeyError::MissingColumn(key_column.to_string()))?;
    Ok(cells.iter().map(normalize::normalize_cell).collect())
}

/// Project one source's raw frame for comparison.
///
/// The result keeps the key column under its original name, the comparison
/// columns that actually exist in the source (absent ones are simply omitted,
/// never an error), and an added `Key` column of normalized keys. A source
/// without the key column gets an all-missing one so its rows still join.
/// When the normalized derivation fails the raw key cells stand in as `Key`
/// rather than failing the sheet.
pub fn project_source(
    frame: &Frame,
    key_column: &str,
    compare_columns: &[String],
) -> Result<Frame> {
    if frame.is_empty() {
        return Ok(empty_projection(key_column, compare_columns));
    }

    let row_count = frame.row_count();
    let raw_keys = frame
        .column(key_column)
        .map(|cells| cells.to_vec())
        .unwrap_or_else(|| vec![None; row_count]);

    let mut projected = Frame::new();
    projected.push_column(key_column, raw_keys.clone())?;
    for column in compare_columns {
        if column == key_column || projected.column(column).is_some() {
            continue;
        }
        if let Some(cells) = frame.column(column) {
            projected.push_column(column, cells.to_vec())?;
        }
    }

    let normalized = match normalized_key_cells(&projected, key_column) {
        Ok(cells) => cells,
        Err(KeyError::MissingColumn(_)) => raw_keys,
    };
    // A key column literally named "Key" is replaced by its normalized form,
    // the same way the comparable column overwrites it downstream anyway.
    projected.replace_or_push_column(layout::KEY_COLUMN, normalized)?;
    Ok(projected)
}

fn empty_projection(key_column: &str, compare_columns: &[String]) -> Frame {
    let mut names: Vec<&str> = vec![key_column];
    for column in compare_columns {
        if column != key_column && !names.contains(&column.as_str()) {
            names.push(column);
        }
    }
    if !names.contains(&layout::KEY_COLUMN) {
        names.push(layout::KEY_COLUMN);
    }
    Frame::with_columns(names)
}
