//! Run configuration: which sheets to reconcile, on which key, across which
//! comparison columns.
//!
//! The configuration is a YAML document:
//!
//! ```yaml
//! sheets:
//!   - name: Customers
//!     key: customer_id
//!     columns: [name, city, balance]
//! ```
//!
//! Malformed individual sheets are skipped with a logged error; a
//! configuration without a single valid sheet aborts the run.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::report::RunLog;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl SheetConfig {
    /// The configured comparison columns with the key column filtered out.
    /// The key never participates in value comparison.
    pub fn comparison_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.trim() != self.key.trim())
            .cloned()
            .unique()
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
}

impl RunConfig {
    pub fn load(path: &Path, log: &mut RunLog) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let parsed: RunConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        parsed.validated(path, log)
    }

    fn validated(self, path: &Path, log: &mut RunLog) -> Result<Self> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut sheets = Vec::with_capacity(self.sheets.len());
        for sheet in self.sheets {
            let name = sheet.name.trim().to_string();
            let key = sheet.key.trim().to_string();
            let columns: Vec<String> = sheet
                .columns
                .iter()
                .map(|column| column.trim().to_string())
                .filter(|column| !column.is_empty())
                .collect();
            if name.is_empty() {
                log.error("Skipping a sheet with an empty name in the configuration");
                continue;
            }
            if key.is_empty() {
                log.error(format!("Sheet '{name}': no key column configured; skipped"));
                continue;
            }
            if columns.is_empty() {
                log.error(format!(
                    "Sheet '{name}': no comparison columns configured; skipped"
                ));
                continue;
            }
            if !seen.insert(name.clone()) {
                log.error(format!(
                    "Sheet '{name}' is configured more than once; keeping the first definition"
                ));
                continue;
            }
            sheets.push(SheetConfig { name, key, columns });
        }
        if sheets.is_empty() {
            bail!("No valid sheet configuration found in {path:?}");
        }
        Ok(RunConfig { sheets })
    }
}
