use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::classify::{ScanOptions, classify_field, split_line};
use crate::cli::VerifyArgs;
use crate::flags::DetectFlags;
use crate::io_utils;
use crate::schema::{ColumnType, Schema};
use crate::table;

/// Checks each input against a stored schema and reports, per column, the
/// values whose observed type the declared type does not cover.
pub fn execute(args: &VerifyArgs) -> Result<()> {
    let opts = args.scan.scan_options();
    let flags = args.scan.detect_flags();
    let encoding = io_utils::resolve_encoding(args.scan.encoding.as_deref())?;
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;

    let mut total = 0usize;
    for input in &args.inputs {
        total += verify_file(input, &schema, &opts, flags, args.limit, encoding)
            .with_context(|| format!("Verifying {input:?}"))?;
    }
    if total > 0 {
        bail!("{total} value(s) do not match the schema");
    }
    Ok(())
}

struct ColumnReport {
    name: String,
    datatype: ColumnType,
    violations: usize,
    first_row: usize,
    first_value: String,
}

impl ColumnReport {
    fn record(&mut self, row: usize, value: &str) {
        if self.violations == 0 {
            self.first_row = row;
            self.first_value = value.to_string();
        }
        self.violations += 1;
    }
}

fn verify_file(
    path: &Path,
    schema: &Schema,
    opts: &ScanOptions,
    flags: DetectFlags,
    limit: usize,
    encoding: &'static Encoding,
) -> Result<usize> {
    let mut reports: Vec<ColumnReport> = schema
        .columns
        .iter()
        .map(|column| ColumnReport {
            name: column.name.clone(),
            datatype: column.datatype,
            violations: 0,
            first_row: 0,
            first_value: String::new(),
        })
        .collect();
    let mut header_pending = schema.has_headers;
    let mut rows_checked = 0usize;
    let mut extra_field_rows = 0usize;

    for line in io_utils::read_lines(path, encoding)? {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }
        if limit != 0 && rows_checked >= limit {
            break;
        }
        rows_checked += 1;
        let fields = split_line(&line, opts);
        if fields.len() > schema.columns.len() {
            extra_field_rows += 1;
        }
        for (idx, report) in reports.iter_mut().enumerate() {
            // A missing field observes Unknown, which every type covers.
            let Some(span) = fields.get(idx) else {
                continue;
            };
            let observed = classify_field(span, flags);
            if !report.datatype.accepts(observed) {
                report.record(rows_checked, span);
            }
        }
    }

    let total: usize = reports.iter().map(|report| report.violations).sum();
    if total == 0 && extra_field_rows == 0 {
        info!("✓ {path:?} matches schema ({rows_checked} row(s) checked)");
        return Ok(0);
    }

    if total > 0 {
        let headers = vec![
            "column".to_string(),
            "type".to_string(),
            "violations".to_string(),
            "first offender".to_string(),
        ];
        let rows = reports
            .iter()
            .filter(|report| report.violations > 0)
            .map(|report| {
                vec![
                    report.name.clone(),
                    report.datatype.to_string(),
                    report.violations.to_string(),
                    format!("row {}: {:?}", report.first_row, report.first_value),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    if extra_field_rows > 0 {
        warn!("{extra_field_rows} row(s) in {path:?} carry more fields than the schema");
    }
    Ok(total + extra_field_rows)
}
