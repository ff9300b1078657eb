use anyhow::{Context, Result, ensure};
use log::info;

use crate::cli::PreviewArgs;
use crate::classify::split_line;
use crate::io_utils;
use crate::rows::parse_typed_row;
use crate::schema::{Schema, infer_schema};
use crate::table;

/// Shows the first rows of the input materialized under a schema, either
/// loaded from disk or inferred on the spot.
pub fn execute(args: &PreviewArgs) -> Result<()> {
    let opts = args.scan.scan_options();
    let flags = args.scan.detect_flags();
    let encoding = io_utils::resolve_encoding(args.scan.encoding.as_deref())?;

    // Without a saved schema the input is read twice, which stdin cannot do.
    ensure!(
        !io_utils::is_dash(&args.input) || args.schema.is_some(),
        "Previewing stdin requires --schema; pipe through `probe -s` first"
    );
    let schema = match &args.schema {
        Some(path) => {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?
        }
        None => infer_schema(&args.input, &opts, flags, args.sample_rows, encoding)?,
    };

    let mut header_pending = schema.has_headers;
    let mut rendered: Vec<Vec<String>> = Vec::new();
    for line in io_utils::read_lines(&args.input, encoding)? {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }
        if rendered.len() >= args.rows {
            break;
        }
        let fields = split_line(&line, &opts);
        let typed = parse_typed_row(&schema, &fields)
            .with_context(|| format!("Row {}", rendered.len() + 1))?;
        rendered.push(typed.iter().map(|value| value.as_display()).collect());
    }

    table::print_table(&schema.headers(), &rendered);
    info!("Displayed {} row(s) from {:?}", rendered.len(), args.input);
    Ok(())
}
