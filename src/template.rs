use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::TemplateArgs,
    mapping::{MappingFile, MappingFormat},
    sheet::{ReadOptions, Workbook},
    surrogate::SurrogateKey,
};

pub fn execute(args: &TemplateArgs) -> Result<()> {
    if args.rand_col_name.is_some() != args.rand_col_length.is_some() {
        bail!("--rand-col-name and --rand-col-length must be used together");
    }
    let options = ReadOptions::resolve(args.delimiter, args.input_encoding.as_deref())?;
    let mut workbook = Workbook::open_sheet(&args.file_path, options, args.sheet_name.as_deref())
        .with_context(|| format!("Opening {:?}", args.file_path))?;
    let sheet = workbook.read_active()?;

    let mut template = MappingFile::template(sheet.headers());
    if let (Some(column), Some(length)) = (&args.rand_col_name, args.rand_col_length) {
        template.surrogate_key = Some(SurrogateKey::new(column.as_str(), length)?);
    }

    let format = match (args.format, &args.output) {
        (Some(format), _) => MappingFormat::from(format),
        (None, Some(path)) => MappingFormat::from_path(path),
        (None, None) => MappingFormat::Json,
    };
    let mut text = template.to_string_pretty(format)?;
    if !text.ends_with('\n') {
        text.push('\n');
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Writing mapping template to {path:?}"))?;
            info!(
                "Mapping template for {} column(s) of sheet '{}' written to {:?}",
                template.columns.len(),
                sheet.name(),
                path
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
