pub mod cli;
pub mod config;
pub mod derive;
pub mod frame;
pub mod io_utils;
pub mod layout;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod project;
pub mod reconcile;
pub mod report;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::RunConfig,
    report::RunLog,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => reconcile::execute(&args),
        Commands::Check(args) => handle_check(&args),
    }
}

fn handle_check(args: &cli::CheckArgs) -> Result<()> {
    let mut log = RunLog::new();
    let config = RunConfig::load(&args.config, &mut log)?;

    let headers = vec![
        "sheet".to_string(),
        "key".to_string(),
        "columns".to_string(),
    ];
    let rows: Vec<Vec<String>> = config
        .sheets
        .iter()
        .map(|sheet| {
            vec![
                sheet.name.clone(),
                sheet.key.clone(),
                sheet.columns.iter().join(", "),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!(
        "Configuration {:?} defines {} sheet(s)",
        args.config,
        config.sheets.len()
    );

    if let Some(input) = &args.input {
        let sources = loader::discover_sources(input, &mut log)?;
        let headers = vec![
            "source".to_string(),
            "kind".to_string(),
            "path".to_string(),
        ];
        let rows: Vec<Vec<String>> = sources
            .iter()
            .map(|source| {
                vec![
                    source.label().to_string(),
                    source.kind().to_string(),
                    source.path().display().to_string(),
                ]
            })
            .collect();
        table::print_table(&headers, &rows);
        info!("Discovered {} source(s) in {input:?}", sources.len());
    }
    Ok(())
}
