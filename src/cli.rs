use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile tabular datasets across sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile every configured sheet across the discovered sources
    Reconcile(ReconcileArgs),
    /// Validate a run configuration and list the sheets it defines
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Directory containing the source files and bundle directories
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Directory to write the reconciled data and reports into
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Run configuration file (YAML)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// CSV delimiter character for reading inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Delimiter to use for the output files (defaults to comma)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Run configuration file (YAML)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Optional input directory to list discovered sources for
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
