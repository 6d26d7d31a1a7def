//! Source discovery and table loading.
//!
//! A source is either a loose CSV/TSV file directly in the input directory
//! (its label is the file stem, and the one file serves every sheet) or a
//! subdirectory bundle (its label is the directory name, and the bundle
//! provides one `<sheet>.csv` file per sheet).
//!
//! Loading never fails into the pipeline: any unreadable or absent table is
//! logged as a warning and yields an empty frame.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;

use crate::{frame::Frame, io_utils, report::RunLog};

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

#[derive(Debug, Clone)]
enum SourceInput {
    File(PathBuf),
    Bundle(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Source {
    label: String,
    input: SourceInput,
}

impl Source {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &'static str {
        match self.input {
            SourceInput::File(_) => "file",
            SourceInput::Bundle(_) => "bundle",
        }
    }

    pub fn path(&self) -> &Path {
        match &self.input {
            SourceInput::File(path) | SourceInput::Bundle(path) => path,
        }
    }

    /// Load this source's table for `sheet`.
    pub fn load_sheet(&self, sheet: &str, options: &ReadOptions, log: &mut RunLog) -> Frame {
        let path = match &self.input {
            SourceInput::File(path) => path.clone(),
            SourceInput::Bundle(dir) => match bundle_sheet_path(dir, sheet) {
                Some(path) => path,
                None => {
                    log.warn(format!(
                        "Source '{}': no file for sheet '{sheet}' in {dir:?}",
                        self.label
                    ));
                    return Frame::new();
                }
            },
        };
        let delimiter = io_utils::resolve_input_delimiter(&path, options.delimiter);
        match io_utils::read_frame(&path, delimiter, options.encoding) {
            Ok(frame) => frame,
            Err(err) => {
                log.warn(format!(
                    "Source '{}': could not read {path:?}: {err:#}",
                    self.label
                ));
                Frame::new()
            }
        }
    }
}

fn bundle_sheet_path(dir: &Path, sheet: &str) -> Option<PathBuf> {
    ["csv", "tsv"]
        .iter()
        .map(|ext| dir.join(format!("{sheet}.{ext}")))
        .find(|path| path.is_file())
}

fn is_tabular_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv"))
}

/// Discover input sources: loose files first, then bundle directories, each
/// group in name order. A bundle whose label collides with a file gets a
/// `_bundle` suffix.
pub fn discover_sources(input_dir: &Path, log: &mut RunLog) -> Result<Vec<Source>> {
    if !input_dir.is_dir() {
        bail!("Input directory {input_dir:?} does not exist");
    }
    let mut files = Vec::new();
    let mut bundles = Vec::new();
    for entry in fs::read_dir(input_dir)
        .with_context(|| format!("Listing input directory {input_dir:?}"))?
    {
        let path = entry
            .with_context(|| format!("Listing input directory {input_dir:?}"))?
            .path();
        if path.is_dir() {
            bundles.push(path);
        } else if is_tabular_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    bundles.sort();

    let mut labels: HashSet<String> = HashSet::new();
    let mut sources = Vec::new();
    for path in files {
        let Some(label) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if !labels.insert(label.clone()) {
            log.warn(format!(
                "Skipping {path:?}: source label '{label}' already in use"
            ));
            continue;
        }
        sources.push(Source {
            label,
            input: SourceInput::File(path),
        });
    }
    for dir in bundles {
        let Some(base) = dir.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let label = if labels.contains(&base) {
            format!("{base}_bundle")
        } else {
            base
        };
        if !labels.insert(label.clone()) {
            log.warn(format!(
                "Skipping {dir:?}: source label '{label}' already in use"
            ));
            continue;
        }
        sources.push(Source {
            label,
            input: SourceInput::Bundle(dir),
        });
    }
    Ok(sources)
}
