pub mod cancel;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod destination;
pub mod engine;
pub mod error;
pub mod ident;
pub mod io_utils;
pub mod load;
pub mod mapping;
pub mod prompt;
pub mod schema;
pub mod sheet;
pub mod statement;
pub mod surrogate;
pub mod table;
pub mod template;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {cli:?}");
    match cli.command {
        Commands::Load(args) => load::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Template(args) => template::execute(&args),
    }
}
