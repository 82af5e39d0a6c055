//! The `load` command: spreadsheet in, committed rows out.
//!
//! Phases run in a fixed order: open the workbook, pick the sheet, read its
//! header row, resolve the column mapping and surrogate key, connect, check
//! the target columns, convert every row, let the operator review, execute.
//! Nothing touches the database before the single commit at the end.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};

use crate::{
    cancel::CancelFlag,
    cli::LoadArgs,
    config::PartialConnection,
    destination::{self, PgDestination},
    engine::InsertPlan,
    error::IngestError,
    ident,
    mapping::{ColumnMapping, MappingFile},
    prompt,
    sheet::{ReadOptions, Sheet, Workbook},
    surrogate::SurrogateKey,
};

pub fn execute(args: &LoadArgs) -> Result<()> {
    let cancel = CancelFlag::new();
    cancel.install_interrupt_handler()?;
    match run(args, &cancel) {
        Err(err) if is_cancellation(&err) => {
            info!("{err:#}");
            println!("Exiting gracefully.");
            Ok(())
        }
        outcome => outcome,
    }
}

fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<IngestError>()
            .is_some_and(IngestError::is_cancelled)
    })
}

fn run(args: &LoadArgs, cancel: &CancelFlag) -> Result<()> {
    if args.rand_col_name.is_some() != args.rand_col_length.is_some() {
        bail!("--rand-col-name and --rand-col-length must be used together");
    }
    let interactive = !args.assume_yes;

    let table = match &args.table_name {
        Some(table) => {
            ident::ensure_table_name(table)?;
            table.clone()
        }
        None if interactive => prompt::table_name()?,
        None => bail!("--table-name is required with --assume-yes"),
    };
    let file_path = match &args.file_path {
        Some(path) => path.clone(),
        None if interactive => prompt::file_path()?,
        None => bail!("--file-path is required with --assume-yes"),
    };

    cancel.checkpoint("schema discovery")?;
    let sheet = read_sheet(args, &file_path, interactive)?;
    info!(
        "Sheet '{}' has {} column(s) and {} data row(s)",
        sheet.name(),
        sheet.headers().len(),
        sheet.rows().len()
    );

    cancel.checkpoint("column mapping")?;
    let (mapping, file_key) = resolve_mapping(args, &sheet, interactive)?;

    cancel.checkpoint("surrogate key")?;
    let surrogate = resolve_surrogate_key(args, file_key, &mapping, interactive)?;

    let plan = InsertPlan::new(&table, mapping, surrogate)?.with_auto_correct(args.auto_correct);

    if args.dry_run {
        let statements = plan.prepare(&sheet, cancel)?;
        for statement in &statements {
            println!("{statement}");
        }
        info!(
            "Dry run produced {} statement(s) for table {}; nothing was executed",
            statements.len(),
            plan.table()
        );
        return Ok(());
    }

    cancel.checkpoint("connection")?;
    let mut destination = connect(args.env_path.as_deref(), interactive, cancel)?;
    let statements = plan.generate(&sheet, &mut destination, cancel)?;

    if interactive && !statements.is_empty() && !prompt::review_statements(&statements)? {
        println!("Aborted; nothing was inserted.");
        return Ok(());
    }

    cancel.checkpoint("execution")?;
    let inserted = destination::execute(&mut destination, &statements)
        .with_context(|| format!("Inserting into {}", plan.table()))?;
    println!("Data inserted. {inserted} row(s) committed to {}.", plan.table());
    Ok(())
}

fn read_sheet(args: &LoadArgs, path: &Path, interactive: bool) -> Result<Sheet> {
    let options = ReadOptions::resolve(args.delimiter, args.input_encoding.as_deref())?;
    let mut workbook = Workbook::open_sheet(path, options, args.sheet_name.as_deref())
        .with_context(|| format!("Opening {path:?}"))?;
    if args.sheet_name.is_none() && workbook.sheet_names().len() > 1 {
        if interactive {
            let chosen = prompt::sheet(workbook.sheet_names())?;
            workbook.select_sheet(&chosen)?;
        } else {
            warn!(
                "Workbook has {} sheets; loading the first, '{}'",
                workbook.sheet_names().len(),
                workbook.active_sheet_name()
            );
        }
    }
    Ok(workbook.read_active()?)
}

fn resolve_mapping(
    args: &LoadArgs,
    sheet: &Sheet,
    interactive: bool,
) -> Result<(ColumnMapping, Option<SurrogateKey>)> {
    match &args.mapping {
        Some(path) => {
            let file = MappingFile::load(path)?;
            let mapping = file
                .resolve(sheet.headers())
                .with_context(|| format!("Applying mapping {path:?} to sheet '{}'", sheet.name()))?;
            Ok((mapping, file.surrogate_key))
        }
        None if interactive => Ok((prompt::column_mapping(sheet.headers())?, None)),
        None => Err(anyhow!("A mapping file (--mapping) is required with --assume-yes")),
    }
}

fn resolve_surrogate_key(
    args: &LoadArgs,
    from_file: Option<SurrogateKey>,
    mapping: &ColumnMapping,
    interactive: bool,
) -> Result<Option<SurrogateKey>> {
    let key = match (&args.rand_col_name, args.rand_col_length) {
        (Some(column), Some(length)) => Some(SurrogateKey::new(column.as_str(), length)?),
        _ => match from_file {
            Some(key) => Some(key),
            None if interactive => prompt::surrogate_key(&mapping.targets())?,
            None => None,
        },
    };
    Ok(key.map(|key| {
        if args.rand_exclude_zero {
            key.with_include_zero(false)
        } else {
            key
        }
    }))
}

/// Connects with the environment's settings. Interactive runs ask for every
/// setting again after a failed attempt; otherwise the failure is final.
fn connect(env_path: Option<&Path>, interactive: bool, cancel: &CancelFlag) -> Result<PgDestination> {
    let mut partial = PartialConnection::from_env(env_path);
    loop {
        let details = if interactive {
            prompt::connection(partial)?
        } else {
            partial.complete()?
        };
        match PgDestination::connect(&details) {
            Ok(destination) => return Ok(destination),
            Err(err) if interactive => {
                warn!("{err}");
                println!("Failed to connect to database. Please enter the connection details again.");
                cancel.checkpoint("connection")?;
                partial = PartialConnection::default();
            }
            Err(err) => return Err(err.into()),
        }
    }
}
