//! Report datasets and the run log.
//!
//! Alongside the reconciled data the run produces three flat datasets —
//! duplicate keys, per-sheet summaries, and per-source dashboard statistics —
//! plus the collected log lines. Each renders to a uniformly shaped frame for
//! the writer; empty datasets keep the informational placeholders the output
//! always carries.

use std::collections::HashMap;

use chrono::Local;
use itertools::Itertools;
use log::{error, info, warn};

use crate::{
    frame::{Cell, Frame},
    project,
};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

/// Append-only log collected over one run and written to the logs report.
/// Every entry is mirrored to the console logger.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.push("INFO", message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.push("WARN", message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.push("ERROR", message);
    }

    fn push(&mut self, level: &str, message: String) {
        self.entries.push(LogEntry {
            time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level: level.to_string(),
            message,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub sheet: String,
    pub source: String,
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub sheet: String,
    pub total: usize,
    pub matches: usize,
    pub mismatches: usize,
}

impl SummaryRecord {
    /// The synthetic summary a failed sheet contributes.
    pub fn zero(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            total: 0,
            matches: 0,
            mismatches: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRecord {
    pub sheet: String,
    pub source: String,
    pub rows: usize,
    pub columns: usize,
    pub key_column: String,
    pub key_non_null: usize,
    pub key_null: usize,
    pub key_unique: usize,
    pub key_duplicates: usize,
}

/// Normalized key values occurring more than once within one source's table.
/// Missing keys are excluded from counting (and reported as a log line).
pub fn find_duplicate_keys(
    frame: &Frame,
    key_column: &str,
    sheet: &str,
    source: &str,
    log: &mut RunLog,
) -> Vec<DuplicateRecord> {
    if frame.is_empty() {
        return Vec::new();
    }
    let Some(raw) = frame.column(key_column) else {
        return Vec::new();
    };
    let keys = match project::normalized_key_cells(frame, key_column) {
        Ok(cells) => cells,
        Err(_) => raw.to_vec(),
    };

    let mut missing = 0usize;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in keys {
        match key {
            None => missing += 1,
            Some(value) => *counts.entry(value).or_insert(0) += 1,
        }
    }
    if missing > 0 {
        log.info(format!(
            "Sheet '{sheet}' source {source}: {missing} missing key(s) excluded from duplicate counting"
        ));
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(key, count)| DuplicateRecord {
            sheet: sheet.to_string(),
            source: source.to_string(),
            key,
            count,
        })
        .collect()
}

struct KeyStats {
    non_null: usize,
    null: usize,
    unique: usize,
    duplicates: usize,
}

/// Raw key-column quality counts. Unlike duplicate detection this looks at
/// the key column as delivered, without normalization.
fn key_stats(frame: &Frame, key_column: &str) -> KeyStats {
    let Some(cells) = frame.column(key_column) else {
        return KeyStats {
            non_null: 0,
            null: frame.row_count(),
            unique: 0,
            duplicates: 0,
        };
    };
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut null = 0usize;
    for cell in cells {
        match cell.as_deref() {
            None => null += 1,
            Some(value) => *counts.entry(value).or_insert(0) += 1,
        }
    }
    let non_null = cells.len() - null;
    let unique = counts.len();
    let duplicates = counts.values().filter(|count| **count > 1).sum();
    KeyStats {
        non_null,
        null,
        unique,
        duplicates,
    }
}

pub fn dashboard_records(
    sheet: &str,
    key_column: &str,
    frames: &[(String, Frame)],
) -> Vec<DashboardRecord> {
    frames
        .iter()
        .map(|(label, frame)| {
            let stats = key_stats(frame, key_column);
            DashboardRecord {
                sheet: sheet.to_string(),
                source: label.clone(),
                rows: frame.row_count(),
                columns: if frame.is_empty() { 0 } else { frame.column_count() },
                key_column: key_column.to_string(),
                key_non_null: stats.non_null,
                key_null: stats.null,
                key_unique: stats.unique,
                key_duplicates: stats.duplicates,
            }
        })
        .collect()
}

pub fn info_frame(message: &str) -> Frame {
    columns_frame(vec![("Info", vec![text(message)])])
}

pub fn duplicates_frame(records: &[DuplicateRecord]) -> Frame {
    if records.is_empty() {
        return info_frame("No duplicate keys found in the supplied sources.");
    }
    let sorted: Vec<&DuplicateRecord> = records
        .iter()
        .sorted_by_key(|r| (r.sheet.clone(), r.source.clone(), r.key.clone()))
        .collect();
    columns_frame(vec![
        ("Sheet", sorted.iter().map(|r| text(&r.sheet)).collect()),
        ("Bron", sorted.iter().map(|r| text(&r.source)).collect()),
        ("Key", sorted.iter().map(|r| text(&r.key)).collect()),
        ("Aantal", sorted.iter().map(|r| number(r.count)).collect()),
    ])
}

pub fn summary_frame(records: &[SummaryRecord]) -> Frame {
    if records.is_empty() {
        return columns_frame(vec![
            ("Sheet", vec![text("<none>")]),
            ("Totaal", vec![number(0)]),
            ("Matches", vec![number(0)]),
            ("Mismatches", vec![number(0)]),
        ]);
    }
    columns_frame(vec![
        ("Sheet", records.iter().map(|r| text(&r.sheet)).collect()),
        ("Totaal", records.iter().map(|r| number(r.total)).collect()),
        ("Matches", records.iter().map(|r| number(r.matches)).collect()),
        (
            "Mismatches",
            records.iter().map(|r| number(r.mismatches)).collect(),
        ),
    ])
}

pub fn dashboard_frame(records: &[DashboardRecord]) -> Frame {
    if records.is_empty() {
        return columns_frame(vec![
            ("Sheet", vec![text("<none>")]),
            ("Bron", vec![text("<none>")]),
            ("Rijen", vec![number(0)]),
            ("Kolommen", vec![number(0)]),
        ]);
    }
    columns_frame(vec![
        ("Sheet", records.iter().map(|r| text(&r.sheet)).collect()),
        ("Bron", records.iter().map(|r| text(&r.source)).collect()),
        ("Rijen", records.iter().map(|r| number(r.rows)).collect()),
        ("Kolommen", records.iter().map(|r| number(r.columns)).collect()),
        (
            "KeyKolom",
            records.iter().map(|r| text(&r.key_column)).collect(),
        ),
        (
            "Key_NonNull",
            records.iter().map(|r| number(r.key_non_null)).collect(),
        ),
        (
            "Key_Null",
            records.iter().map(|r| number(r.key_null)).collect(),
        ),
        (
            "Key_Uniek",
            records.iter().map(|r| number(r.key_unique)).collect(),
        ),
        (
            "Key_Duplicaten",
            records.iter().map(|r| number(r.key_duplicates)).collect(),
        ),
    ])
}

pub fn logs_frame(log: &RunLog) -> Frame {
    let entries = log.entries();
    columns_frame(vec![
        ("Tijd", entries.iter().map(|e| text(&e.time)).collect()),
        ("Niveau", entries.iter().map(|e| text(&e.level)).collect()),
        ("Bericht", entries.iter().map(|e| text(&e.message)).collect()),
    ])
}

fn columns_frame(columns: Vec<(&str, Vec<Cell>)>) -> Frame {
    let mut frame = Frame::new();
    for (name, cells) in columns {
        frame
            .push_column(name, cells)
            .expect("report frame columns are uniform");
    }
    frame
}

fn text(value: &str) -> Cell {
    Some(value.to_string())
}

fn number(value: usize) -> Cell {
    Some(value.to_string())
}
