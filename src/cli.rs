use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    classify::ScanOptions,
    flags::DetectFlags,
    schema::{self, TypeOverride},
};

#[derive(Debug, Parser)]
#[command(version, about = "Inspect delimited text files and infer column types", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sample a file, infer per-column types, and report or save the schema
    Probe(ProbeArgs),
    /// Render the first rows as typed values against a schema
    Preview(PreviewArgs),
    /// Check files against a saved schema and report type violations
    Verify(VerifyArgs),
}

/// Scan configuration shared by every subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Field separator characters; any member splits fields (escapes: \t \n \r \\)
    #[arg(long, default_value = ",", value_parser = parse_charset)]
    pub separator: String,
    /// Exact sequence opening a quoted field (empty disables quoting)
    #[arg(long = "quote-lead", default_value = "\"", value_parser = parse_charset)]
    pub quote_lead: String,
    /// Exact sequence closing a quoted field
    #[arg(long = "quote-trail", default_value = "\"", value_parser = parse_charset)]
    pub quote_trail: String,
    /// Characters skipped around fields and separators
    #[arg(long, default_value = " \\t", value_parser = parse_charset)]
    pub whitespace: String,
    /// Character encoding of the input (defaults to utf-8)
    #[arg(long)]
    pub encoding: Option<String>,
    /// Treat the first line as a header row
    #[arg(long = "has-header", conflicts_with = "no_header")]
    pub has_header: bool,
    /// Treat the first line as data and synthesize column names
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Boolean token families to detect (default: true-false,yes-no)
    #[arg(long = "booleans", value_enum, value_delimiter = ',')]
    pub booleans: Option<Vec<BooleanFamily>>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum BooleanFamily {
    /// "true"/"false" tokens
    TrueFalse,
    /// "yes"/"no" tokens
    YesNo,
    /// "0"/"1" tokens
    Integer,
}

impl ScanArgs {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            separators: self.separator.clone(),
            quote_lead: self.quote_lead.clone(),
            quote_trail: self.quote_trail.clone(),
            whitespace: self.whitespace.clone(),
        }
    }

    pub fn detect_flags(&self) -> DetectFlags {
        let mut flags = DetectFlags::SKIP_EMPTY_LINES | DetectFlags::ANY_INTEGER;
        match &self.booleans {
            // Integer booleans are opt-in: unflagged "0"/"1" columns are int8.
            None => flags |= DetectFlags::TRUE_FALSE_BOOLEANS | DetectFlags::YES_NO_BOOLEANS,
            Some(families) => {
                for family in families {
                    flags |= match family {
                        BooleanFamily::TrueFalse => DetectFlags::TRUE_FALSE_BOOLEANS,
                        BooleanFamily::YesNo => DetectFlags::YES_NO_BOOLEANS,
                        BooleanFamily::Integer => DetectFlags::INTEGER_BOOLEANS,
                    };
                }
            }
        }
        if self.has_header {
            flags |= DetectFlags::HAS_HEADER;
        }
        if self.no_header {
            flags |= DetectFlags::NO_HEADER;
        }
        flags
    }
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input file to probe ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Write the inferred schema to this YAML file
    #[arg(short = 's', long = "write-schema")]
    pub write_schema: Option<PathBuf>,
    /// Number of rows to sample when inferring types (0 means full scan)
    #[arg(long = "sample-rows", default_value_t = schema::DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    /// Record empty lines as single-column rows instead of skipping them
    #[arg(long = "keep-empty-lines")]
    pub keep_empty_lines: bool,
    /// Fail when a data row's field count differs from the first row's
    #[arg(long = "fixed-columns")]
    pub fixed_columns: bool,
    /// Override inferred column types with name:type or #index:type specs
    #[arg(long = "types", action = clap::ArgAction::Append, value_parser = parse_type_override)]
    pub types: Vec<TypeOverride>,
    /// Emit the schema as JSON on stdout
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Schema YAML to read column types from (inferred when omitted)
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Number of rows to sample when inferring types (0 means full scan)
    #[arg(long = "sample-rows", default_value_t = schema::DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Schema YAML describing the expected column types
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// One or more input files to verify
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Maximum rows to scan per file (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    #[command(flatten)]
    pub scan: ScanArgs,
}

pub fn parse_charset(value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("Unknown escape '\\{other}' in '{value}'")),
            None => return Err(format!("Dangling escape in '{value}'")),
        }
    }
    Ok(out)
}

pub fn parse_type_override(value: &str) -> Result<TypeOverride, String> {
    value
        .parse()
        .map_err(|err: anyhow::Error| err.to_string())
}
