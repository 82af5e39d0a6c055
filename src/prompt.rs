//! Interactive prompts used when the command line or mapping file leaves a
//! decision open. Every prompt re-asks until the answer is valid.

use std::{io, path::PathBuf, str::FromStr};

use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use log::debug;

use crate::{
    config::{ConnectionDetails, PartialConnection, parse_port},
    error::{IngestError, IngestResult},
    ident,
    mapping::{ColumnMapping, ColumnMappingBuilder, suggest_identifier},
    schema::{ColumnSpec, ColumnType},
    statement::InsertStatement,
    surrogate::{MAX_SURROGATE_LENGTH, SurrogateKey},
};

const TYPE_HELP: &str = "/?";

fn prompt_error(err: dialoguer::Error) -> IngestError {
    IngestError::Io(io::Error::other(err.to_string()))
}

fn ask_text<F>(prompt: &str, default: Option<String>, validate: F) -> IngestResult<String>
where
    F: FnMut(&String) -> Result<(), String>,
{
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default);
    }
    input
        .validate_with(validate)
        .interact_text()
        .map(|value| value.trim().to_string())
        .map_err(prompt_error)
}

pub fn table_name() -> IngestResult<String> {
    ask_text(
        "Enter the name of the table to insert the data into",
        None,
        |value| ident::ensure_table_name(value.trim()).map_err(|err| err.to_string()),
    )
}

pub fn file_path() -> IngestResult<PathBuf> {
    ask_text("Enter the path to the spreadsheet", None, |value| {
        let path = PathBuf::from(value.trim());
        if path.is_file() {
            Ok(())
        } else {
            Err(format!("{path:?} is not a readable file"))
        }
    })
    .map(PathBuf::from)
}

pub fn sheet(names: &[String]) -> IngestResult<String> {
    println!("Found multiple sheets.");
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select the sheet to load")
        .items(names)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    Ok(names[choice].clone())
}

/// Walks every header and asks for its target column, type and optional
/// allowed values.
pub fn column_mapping(headers: &[String]) -> IngestResult<ColumnMapping> {
    println!(
        "You will now be asked, for each spreadsheet column, which database column it maps to."
    );
    let mut builder = ColumnMappingBuilder::new(headers);
    for header in headers {
        println!("Spreadsheet column: {header}");
        let target = ask_text(
            "Database column name",
            Some(suggest_identifier(header)),
            |value| {
                let value = value.trim();
                ident::ensure_identifier("column name", value).map_err(|err| err.to_string())?;
                if builder.is_target_taken(value) {
                    return Err(format!("'{value}' is already mapped"));
                }
                Ok(())
            },
        )?;
        let column_type = column_type()?;
        let mut spec = ColumnSpec::new(header, &target, column_type.clone())?;
        if column_type.is_text_like() || column_type.is_custom() {
            let allowed = ask_text(
                "Allowed values, comma separated (leave blank to accept any)",
                Some(String::new()),
                |_| Ok(()),
            )?;
            let values: Vec<String> = allowed
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if !values.is_empty() {
                spec = spec.with_allowed_values(values);
            }
        }
        builder.insert(spec)?;
    }
    builder.build()
}

fn column_type() -> IngestResult<ColumnType> {
    loop {
        let answer = ask_text(
            &format!("Data type for this column ({TYPE_HELP} lists the built-in types)"),
            None,
            |_| Ok(()),
        )?;
        if answer == TYPE_HELP {
            println!("Data types:");
            for name in ColumnType::variants() {
                println!("  {name}");
            }
            println!("Any other valid identifier is treated as a custom database type.");
            continue;
        }
        match ColumnType::from_str(&answer) {
            Ok(column_type) => return Ok(column_type),
            Err(err) => println!("{err}"),
        }
    }
}

pub fn surrogate_key(taken: &[&str]) -> IngestResult<Option<SurrogateKey>> {
    let wanted = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Generate a random ID column?")
        .default(false)
        .interact()
        .map_err(prompt_error)?;
    if !wanted {
        return Ok(None);
    }
    let column = ask_text("Name of the random ID column", None, |value| {
        let value = value.trim();
        ident::ensure_identifier("column name", value).map_err(|err| err.to_string())?;
        if taken.contains(&value) {
            return Err(format!("'{value}' is already a mapped column"));
        }
        Ok(())
    })?;
    let length = Input::<usize>::with_theme(&ColorfulTheme::default())
        .with_prompt("Length of the random ID")
        .validate_with(|length: &usize| {
            if (1..=MAX_SURROGATE_LENGTH).contains(length) {
                Ok(())
            } else {
                Err(format!("Length must be between 1 and {MAX_SURROGATE_LENGTH}"))
            }
        })
        .interact_text()
        .map_err(prompt_error)?;
    SurrogateKey::new(column, length).map(Some)
}

/// Asks for whatever `partial` is missing. The password is read without echo.
pub fn connection(mut partial: PartialConnection) -> IngestResult<ConnectionDetails> {
    if partial
        .port
        .as_deref()
        .is_some_and(|port| parse_port(port).is_err())
    {
        println!("Port must be an integer between 1 and 65535.");
        partial.port = None;
    }
    if partial.host.is_none() {
        partial.host = Some(ask_text("Database host", None, non_empty)?);
    }
    if partial.port.is_none() {
        partial.port = Some(ask_text("Database port", Some("5432".to_string()), |value| {
            parse_port(value).map(|_| ()).map_err(|err| err.to_string())
        })?);
    }
    if partial.user.is_none() {
        partial.user = Some(ask_text("Database username", None, non_empty)?);
    }
    if partial.password.is_none() {
        let password = rpassword::prompt_password("Database password (input hidden): ")?;
        partial.password = Some(password);
    }
    if partial.database.is_none() {
        partial.database = Some(ask_text("Database name", None, non_empty)?);
    }
    debug!("Connection settings gathered: {partial:?}");
    partial.complete()
}

fn non_empty(value: &String) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("A value is required".to_string())
    } else {
        Ok(())
    }
}

/// Lets the operator inspect the statements before anything runs. Returns
/// whether to execute.
pub fn review_statements(statements: &[InsertStatement]) -> IngestResult<bool> {
    let options = ["Show the SQL", "Execute", "Abort"];
    loop {
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "{} statement(s) ready. What next?",
                statements.len()
            ))
            .items(&options[..])
            .default(0)
            .interact()
            .map_err(prompt_error)?;
        match choice {
            0 => {
                for statement in statements {
                    println!("{statement}");
                }
            }
            1 => return Ok(true),
            _ => return Ok(false),
        }
    }
}
