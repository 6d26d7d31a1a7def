//! In-memory table model shared by every stage of the pipeline.
//!
//! A [`Frame`] is a set of named columns holding equal-length vectors of
//! nullable text cells. `None` is the explicit missing marker and is distinct
//! from `Some("")`: normalization and comparison rely on that difference.
//!
//! Input frames built with [`Frame::with_columns`] tolerate duplicate header
//! names (lookups resolve to the first occurrence, as raw files sometimes
//! repeat a header); frames assembled with [`Frame::push_column`] reject them.

use anyhow::{Result, bail};

pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-row frame shaped with the given column names.
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let columns = names.iter().map(|_| Vec::new()).collect();
        Self { names, columns }
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// True when the frame has no rows. A frame can be empty and still carry
    /// column names.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.column_index(name).map(|idx| self.columns[idx].as_slice())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&String, &[Cell])> {
        self.names.iter().zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) -> Result<()> {
        let name = name.into();
        if self.column_index(&name).is_some() {
            bail!("Column '{name}' already exists");
        }
        if !self.names.is_empty() && cells.len() != self.row_count() {
            bail!(
                "Column '{name}' has {} cell(s), expected {}",
                cells.len(),
                self.row_count()
            );
        }
        self.names.push(name);
        self.columns.push(cells);
        Ok(())
    }

    /// Replace an existing column's cells, or append the column if absent.
    pub fn replace_or_push_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<()> {
        match self.column_index(name) {
            Some(idx) => {
                if cells.len() != self.row_count() {
                    bail!(
                        "Column '{name}' has {} cell(s), expected {}",
                        cells.len(),
                        self.row_count()
                    );
                }
                self.columns[idx] = cells;
                Ok(())
            }
            None => self.push_column(name, cells),
        }
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.names.len() {
            bail!(
                "Row has {} cell(s), expected {}",
                cells.len(),
                self.names.len()
            );
        }
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
        Ok(())
    }

    pub fn row(&self, index: usize) -> Vec<Cell> {
        self.columns.iter().map(|column| column[index].clone()).collect()
    }

    /// A new frame holding the named columns in the given order.
    pub fn select(&self, names: &[String]) -> Result<Frame> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| anyhow::anyhow!("Column '{name}' not found"))?;
            columns.push(self.columns[idx].clone());
        }
        Ok(Frame {
            names: names.to_vec(),
            columns,
        })
    }

    /// A new frame without the named column. No-op when the column is absent.
    pub fn drop_column(&self, name: &str) -> Frame {
        match self.column_index(name) {
            None => self.clone(),
            Some(drop_idx) => {
                let mut names = Vec::with_capacity(self.names.len() - 1);
                let mut columns = Vec::with_capacity(self.columns.len() - 1);
                for (idx, (column_name, cells)) in
                    self.names.iter().zip(&self.columns).enumerate()
                {
                    if idx == drop_idx {
                        continue;
                    }
                    names.push(column_name.clone());
                    columns.push(cells.clone());
                }
                Frame { names, columns }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Cell> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn push_column_rejects_ragged_lengths() {
        let mut frame = Frame::new();
        frame
            .push_column("a", cells(&[Some("1"), Some("2")]))
            .unwrap();
        assert!(frame.push_column("b", cells(&[Some("1")])).is_err());
    }

    #[test]
    fn push_column_rejects_duplicate_names() {
        let mut frame = Frame::new();
        frame.push_column("a", cells(&[Some("1")])).unwrap();
        assert!(frame.push_column("a", cells(&[Some("2")])).is_err());
    }

    #[test]
    fn select_preserves_requested_order() {
        let mut frame = Frame::new();
        frame.push_column("a", cells(&[Some("1")])).unwrap();
        frame.push_column("b", cells(&[Some("2")])).unwrap();
        let selected = frame
            .select(&["b".to_string(), "a".to_string()])
            .expect("select");
        assert_eq!(selected.names(), ["b", "a"]);
        assert_eq!(selected.row(0), cells(&[Some("2"), Some("1")]));
    }

    #[test]
    fn drop_column_leaves_other_columns_intact() {
        let mut frame = Frame::new();
        frame.push_column("a", cells(&[Some("1")])).unwrap();
        frame.push_column("b", cells(&[None])).unwrap();
        let dropped = frame.drop_column("a");
        assert_eq!(dropped.names(), ["b"]);
        assert_eq!(dropped.row_count(), 1);
        assert_eq!(frame.column_count(), 2);
    }

    #[test]
    fn empty_frame_with_columns_has_shape_but_no_rows() {
        let frame = Frame::with_columns(["id", "name"]);
        assert!(frame.is_empty());
        assert_eq!(frame.column_count(), 2);
        assert_eq!(frame.column("id"), Some(&[][..]));
    }
}
