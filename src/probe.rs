use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::cli::ProbeArgs;
use crate::flags::DetectFlags;
use crate::io_utils;
use crate::schema::{InferenceStats, Schema, infer_schema_with_stats};
use crate::table;

/// Scans a sample of the input and reports the narrowest column types
/// that cover every value seen.
pub fn execute(args: &ProbeArgs) -> Result<()> {
    let opts = args.scan.scan_options();
    let mut flags = args.scan.detect_flags();
    if args.keep_empty_lines {
        flags -= DetectFlags::SKIP_EMPTY_LINES;
    }
    if args.fixed_columns {
        flags |= DetectFlags::FIXED_COLUMNS;
    }
    let encoding = io_utils::resolve_encoding(args.scan.encoding.as_deref())?;

    let (mut schema, stats) =
        infer_schema_with_stats(&args.input, &opts, flags, args.sample_rows, encoding)?;
    schema.apply_overrides(&args.types)?;

    if args.json {
        print_json(&schema, &stats)?;
    } else {
        print_report(&schema, &stats);
        info!(
            "Sampled {} data row(s) from {:?} ({} empty line(s))",
            stats.rows_read(),
            args.input,
            stats.empty_lines()
        );
    }

    if let Some(path) = &args.write_schema {
        schema.save(path)?;
        info!(
            "Wrote schema for {} column(s) to {:?}",
            schema.columns.len(),
            path
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    #[serde(flatten)]
    schema: &'a Schema,
    rows_read: usize,
    requested_rows: usize,
    empty_lines: usize,
}

fn print_json(schema: &Schema, stats: &InferenceStats) -> Result<()> {
    let report = ProbeReport {
        schema,
        rows_read: stats.rows_read(),
        requested_rows: stats.requested_rows(),
        empty_lines: stats.empty_lines(),
    };
    let rendered =
        serde_json::to_string_pretty(&report).context("Serializing the probe report")?;
    println!("{rendered}");
    Ok(())
}

fn print_report(schema: &Schema, stats: &InferenceStats) {
    let headers = vec![
        "column".to_string(),
        "type".to_string(),
        "sample".to_string(),
    ];
    let rows = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                column.name.clone(),
                column.datatype.to_string(),
                stats.sample_value(idx).unwrap_or_default().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
