//! The reconciliation run: compare pipeline per sheet, duplicate and
//! dashboard reporting, output writing.
//!
//! Sheets are processed strictly sequentially and independently; a failure in
//! one sheet is caught here, contributes a zero-valued summary, and never
//! stops the remaining sheets. The user always ends up with a complete output
//! set.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;

use crate::{
    cli::ReconcileArgs,
    config::{RunConfig, SheetConfig},
    derive::{self, MismatchDetail},
    frame::Frame,
    io_utils, layout,
    loader::{self, ReadOptions, Source},
    merge, project,
    report::{self, DashboardRecord, DuplicateRecord, RunLog, SummaryRecord},
    table,
};

pub fn execute(args: &ReconcileArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding,
    };
    let output_delimiter = args
        .output_delimiter
        .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);

    let mut log = RunLog::new();
    log.info("Starting reconciliation run");

    let sources = loader::discover_sources(&args.input, &mut log)?;
    if sources.is_empty() {
        bail!(
            "No source files (*.csv, *.tsv) or bundle directories found in {:?}",
            args.input
        );
    }
    log.info(format!(
        "Discovered {} source(s): {}",
        sources.len(),
        sources.iter().map(Source::label).join(", ")
    ));

    let config = RunConfig::load(&args.config, &mut log)?;

    let book = OutputBook::create(&args.output, output_delimiter)?;

    let mut summaries: Vec<SummaryRecord> = Vec::new();
    let mut duplicates: Vec<DuplicateRecord> = Vec::new();
    let mut dashboards: Vec<DashboardRecord> = Vec::new();

    for sheet in &config.sheets {
        match process_sheet(sheet, &sources, &options, &mut log) {
            Ok(outcome) => {
                book.write_sheet(&sheet.name, &outcome.frame)?;
                log.info(format!(
                    "Sheet '{}': {} matches, {} mismatches",
                    sheet.name, outcome.summary.matches, outcome.summary.mismatches
                ));
                log_mismatches(&outcome.mismatch_rows, &mut log);
                summaries.push(outcome.summary);
                duplicates.extend(outcome.duplicates);
                dashboards.extend(outcome.dashboard);
            }
            Err(err) => {
                log.error(format!(
                    "Failed to process sheet '{}': {err:#}",
                    sheet.name
                ));
                book.write_sheet(&sheet.name, &Frame::new())?;
                summaries.push(SummaryRecord::zero(&sheet.name));
            }
        }
    }

    book.write_report("duplicates", &report::duplicates_frame(&duplicates))?;
    book.write_report("summary", &report::summary_frame(&summaries))?;
    book.write_report("dashboard", &report::dashboard_frame(&dashboards))?;
    book.write_report("logs", &report::logs_frame(&log))?;

    info!(
        "Reconciled {} sheet(s) into {:?}",
        summaries.len(),
        args.output
    );
    print_summary(&summaries);
    Ok(())
}

pub struct Comparison {
    pub frame: Frame,
    pub matches: usize,
    pub mismatches: usize,
    pub mismatch_rows: Vec<MismatchDetail>,
}

/// The compare pipeline for one sheet: project every source, outer-join on
/// the normalized key, derive presence and match verdicts, and arrange the
/// result into the fixed column order. The key column never participates in
/// the comparison set.
pub fn compare_sources(
    frames: &[(String, Frame)],
    compare_columns: &[String],
    key_column: &str,
) -> Result<Comparison> {
    let key = key_column.trim();
    let compare: Vec<String> = compare_columns
        .iter()
        .map(|column| column.trim().to_string())
        .filter(|column| !column.is_empty() && column != key)
        .unique()
        .collect();
    let labels: Vec<String> = frames.iter().map(|(label, _)| label.clone()).collect();

    let projected: Vec<(String, Frame)> = frames
        .iter()
        .map(|(label, frame)| {
            Ok((
                label.clone(),
                project::project_source(frame, key, &compare)?,
            ))
        })
        .collect::<Result<_>>()?;
    let merged = merge::merge_projected(&projected)?;
    let derivation = derive::derive(&merged, &projected, key, &compare)?;
    let frame = layout::arrange(&derivation.frame, &labels, &compare)?;

    Ok(Comparison {
        frame,
        matches: derivation.matches,
        mismatches: derivation.mismatches,
        mismatch_rows: derivation.mismatch_rows,
    })
}

pub struct SheetOutcome {
    pub frame: Frame,
    pub summary: SummaryRecord,
    pub duplicates: Vec<DuplicateRecord>,
    pub dashboard: Vec<DashboardRecord>,
    pub mismatch_rows: Vec<MismatchDetail>,
}

/// One sheet end to end: load, compare, and scan for duplicates and
/// dashboard statistics. The duplicate and dashboard passes work on the raw
/// tables, independent of the merge pipeline.
pub fn process_sheet(
    sheet: &SheetConfig,
    sources: &[Source],
    options: &ReadOptions,
    log: &mut RunLog,
) -> Result<SheetOutcome> {
    let frames: Vec<(String, Frame)> = sources
        .iter()
        .map(|source| {
            (
                source.label().to_string(),
                source.load_sheet(&sheet.name, options, log),
            )
        })
        .collect();

    let comparison = compare_sources(&frames, &sheet.columns, &sheet.key)?;

    let mut duplicates = Vec::new();
    for (label, frame) in &frames {
        duplicates.extend(report::find_duplicate_keys(
            frame, &sheet.key, &sheet.name, label, log,
        ));
    }
    let dashboard = report::dashboard_records(&sheet.name, &sheet.key, &frames);

    let summary = SummaryRecord {
        sheet: sheet.name.clone(),
        total: comparison.frame.row_count(),
        matches: comparison.matches,
        mismatches: comparison.mismatches,
    };

    Ok(SheetOutcome {
        frame: comparison.frame,
        summary,
        duplicates,
        dashboard,
        mismatch_rows: comparison.mismatch_rows,
    })
}

fn log_mismatches(details: &[MismatchDetail], log: &mut RunLog) {
    for detail in details {
        let key = detail
            .key
            .clone()
            .unwrap_or_else(|| "<no key>".to_string());
        if !detail.missing_sources.is_empty() {
            log.info(format!(
                "  - Key {key}: missing from {}",
                detail.missing_sources.iter().join(", ")
            ));
        }
        if !detail.mismatched_columns.is_empty() {
            log.info(format!(
                "  - Key {key}: mismatch in columns: {}",
                detail.mismatched_columns.iter().join(", ")
            ));
        }
    }
}

/// Owns the output location for the whole batch: per-sheet data files under
/// `data/`, report datasets under `reports/`. Every write flushes before
/// returning.
struct OutputBook {
    data_dir: PathBuf,
    reports_dir: PathBuf,
    delimiter: u8,
}

impl OutputBook {
    fn create(root: &Path, delimiter: u8) -> Result<Self> {
        let data_dir = root.join("data");
        let reports_dir = root.join("reports");
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Creating output directory {data_dir:?}"))?;
        fs::create_dir_all(&reports_dir)
            .with_context(|| format!("Creating output directory {reports_dir:?}"))?;
        Ok(Self {
            data_dir,
            reports_dir,
            delimiter,
        })
    }

    /// Write one sheet's reconciled frame. An empty frame becomes an
    /// informational placeholder; the internal `BronMatch` verdict is not
    /// persisted to the data view.
    fn write_sheet(&self, sheet: &str, frame: &Frame) -> Result<()> {
        let out = if frame.is_empty() {
            report::info_frame("No data found in any source or configuration empty.")
        } else {
            frame.drop_column(layout::SOURCE_MATCH_COLUMN)
        };
        let path = self.data_dir.join(sheet_file_name(sheet));
        io_utils::write_frame(&path, &out, self.delimiter)
    }

    fn write_report(&self, name: &str, frame: &Frame) -> Result<()> {
        let path = self.reports_dir.join(format!("{name}.csv"));
        io_utils::write_frame(&path, frame, self.delimiter)
    }
}

fn sheet_file_name(sheet: &str) -> String {
    let stem: String = sheet
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.csv", stem.trim())
}

fn print_summary(summaries: &[SummaryRecord]) {
    let headers = vec![
        "Sheet".to_string(),
        "Totaal".to_string(),
        "Matches".to_string(),
        "Mismatches".to_string(),
    ];
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.sheet.clone(),
                summary.total.to_string(),
                summary.matches.to_string(),
                summary.mismatches.to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
}
