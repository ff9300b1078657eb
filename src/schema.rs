//! Schema model, the type promotion lattice, YAML persistence, and the
//! sampling driver.
//!
//! This module owns the [`ColumnType`] enum (the 12-value promotion
//! lattice), the merge operation that folds per-line observations into
//! per-column types, the [`Schema`] struct with YAML save/load, header
//! detection heuristics, and [`infer_schema()`] which samples a line source
//! and snapshots the result.
//!
//! ## Responsibilities
//!
//! - YAML schema loading and saving via `serde_yaml`
//! - The pairwise merge lattice ([`merge_column_type()`], [`merge_types()`])
//! - Header detection and synthetic name assignment
//! - Type inference with configurable sample size (default 100 rows, 0 = all)
//! - Caller type overrides (`name:type` / `#index:type` specs)

use std::{collections::VecDeque, fmt, fs::File, io, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow, ensure};
use encoding_rs::Encoding;
use itertools::{EitherOrBoth, Itertools};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{ScanOptions, classify_field, split_line},
    flags::{DetectFlags, HeaderMode},
    io_utils,
};

const CURRENT_SCHEMA_VERSION: &str = "1.0.0";
const HEADER_DETECTION_SAMPLE_ROWS: usize = 6;

/// Rows sampled by default before the schema snapshot is taken.
pub const DEFAULT_SAMPLE_ROWS: usize = 100;

const COMMON_HEADER_TOKENS: &[&str] = &[
    "address",
    "amount",
    "category",
    "city",
    "code",
    "count",
    "country",
    "created",
    "date",
    "description",
    "email",
    "id",
    "key",
    "label",
    "name",
    "price",
    "quantity",
    "score",
    "state",
    "status",
    "time",
    "title",
    "total",
    "type",
    "updated",
    "value",
];

/// The promotion lattice of column types.
///
/// [`ColumnType::Unknown`] is the bottom (no evidence yet) and
/// [`ColumnType::String`] the absorbing top. Signed and unsigned integers
/// form two width chains joined through `Float64` and, for mixed
/// signedness, through the signed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float64,
    String,
    Unknown,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Int8 => "int8",
            ColumnType::UInt8 => "uint8",
            ColumnType::Int16 => "int16",
            ColumnType::UInt16 => "uint16",
            ColumnType::Int32 => "int32",
            ColumnType::UInt32 => "uint32",
            ColumnType::Int64 => "int64",
            ColumnType::UInt64 => "uint64",
            ColumnType::Float64 => "float64",
            ColumnType::String => "string",
            ColumnType::Unknown => "unknown",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "boolean", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
            "float64", "string", "unknown",
        ]
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ColumnType::Int8 | ColumnType::Int16 | ColumnType::Int32 | ColumnType::Int64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ColumnType::UInt8 | ColumnType::UInt16 | ColumnType::UInt32 | ColumnType::UInt64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Width in bits for the integer types.
    pub fn integer_bits(self) -> Option<u32> {
        match self {
            ColumnType::Int8 | ColumnType::UInt8 => Some(8),
            ColumnType::Int16 | ColumnType::UInt16 => Some(16),
            ColumnType::Int32 | ColumnType::UInt32 => Some(32),
            ColumnType::Int64 | ColumnType::UInt64 => Some(64),
            _ => None,
        }
    }

    /// True when a value observed as `observed` fits a column of this type.
    ///
    /// Equivalent to asking whether merging the observation would leave the
    /// column type unchanged.
    pub fn accepts(self, observed: ColumnType) -> bool {
        merge_column_type(self, observed) == self
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "int8" | "i8" => Ok(ColumnType::Int8),
            "uint8" | "u8" => Ok(ColumnType::UInt8),
            "int16" | "i16" => Ok(ColumnType::Int16),
            "uint16" | "u16" => Ok(ColumnType::UInt16),
            "int32" | "i32" | "int" => Ok(ColumnType::Int32),
            "uint32" | "u32" | "uint" => Ok(ColumnType::UInt32),
            "int64" | "i64" | "long" => Ok(ColumnType::Int64),
            "uint64" | "u64" => Ok(ColumnType::UInt64),
            "float64" | "f64" | "float" | "double" => Ok(ColumnType::Float64),
            "string" | "str" | "text" => Ok(ColumnType::String),
            "unknown" => Ok(ColumnType::Unknown),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                ColumnType::variants().join(", ")
            )),
        }
    }
}

/// Merges two observations of the same column.
///
/// Commutative and associative, with `Unknown` as identity and `String`
/// absorbing. Integer widths promote within their signedness chain; mixed
/// signedness promotes to a signed type wide enough for the wider operand,
/// capped at `Int64`. Boolean and numeric evidence never reconcile.
pub fn merge_column_type(a: ColumnType, b: ColumnType) -> ColumnType {
    use ColumnType::*;

    if a == b {
        return a;
    }
    match (a, b) {
        (Unknown, other) | (other, Unknown) => other,
        (String, _) | (_, String) => String,
        (Boolean, _) | (_, Boolean) => String,
        (Float64, other) | (other, Float64) if other.is_integer() => Float64,
        _ => match (a.integer_bits(), b.integer_bits()) {
            (Some(a_bits), Some(b_bits)) => {
                let bits = a_bits.max(b_bits);
                if a.is_unsigned_integer() && b.is_unsigned_integer() {
                    unsigned_with_bits(bits)
                } else {
                    // Mixed signedness settles on the signed chain. Int64
                    // cannot hold the top of the u64 range; the cap stands.
                    signed_with_bits(bits)
                }
            }
            _ => String,
        },
    }
}

/// Folds one line's types into the running per-column accumulator.
///
/// Vectors of different lengths merge pairwise and the longer tail carries
/// over unchanged, so ragged inputs widen the accumulator.
pub fn merge_types(acc: &[ColumnType], line: &[ColumnType]) -> Vec<ColumnType> {
    acc.iter()
        .zip_longest(line.iter())
        .map(|pair| match pair {
            EitherOrBoth::Both(a, b) => merge_column_type(*a, *b),
            EitherOrBoth::Left(a) => *a,
            EitherOrBoth::Right(b) => *b,
        })
        .collect()
}

fn signed_with_bits(bits: u32) -> ColumnType {
    match bits {
        8 => ColumnType::Int8,
        16 => ColumnType::Int16,
        32 => ColumnType::Int32,
        _ => ColumnType::Int64,
    }
}

fn unsigned_with_bits(bits: u32) -> ColumnType {
    match bits {
        8 => ColumnType::UInt8,
        16 => ColumnType::UInt16,
        32 => ColumnType::UInt32,
        _ => ColumnType::UInt64,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub datatype: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default = "Schema::default_has_headers")]
    pub has_headers: bool,
}

impl Schema {
    pub const fn default_has_headers() -> bool {
        true
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut schema = self.clone();
        if schema.schema_version.is_none() {
            schema.schema_version = Some(CURRENT_SCHEMA_VERSION.to_string());
        }
        let file =
            File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, &schema).context("Writing schema YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing schema YAML")
    }

    /// Applies caller overrides after inference. Unknown names or
    /// out-of-range indexes are errors.
    pub fn apply_overrides(&mut self, overrides: &[TypeOverride]) -> Result<()> {
        for spec in overrides {
            let index = match &spec.target {
                OverrideTarget::Name(name) => self.column_index(name).ok_or_else(|| {
                    anyhow!(
                        "Schema has no column named '{name}'. Known columns: {}",
                        self.headers().join(", ")
                    )
                })?,
                OverrideTarget::Index(index) => {
                    ensure!(
                        *index < self.columns.len(),
                        "Column index {} is out of range; the schema has {} column(s)",
                        index + 1,
                        self.columns.len()
                    );
                    *index
                }
            };
            self.columns[index].datatype = spec.datatype;
        }
        Ok(())
    }
}

/// A caller-supplied type override, written `name:type` or `#index:type`
/// with 1-based indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOverride {
    pub target: OverrideTarget,
    pub datatype: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideTarget {
    Name(String),
    Index(usize),
}

impl FromStr for TypeOverride {
    type Err = anyhow::Error;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (target, datatype) = spec.rsplit_once(':').ok_or_else(|| {
            anyhow!("Override '{spec}' must be name:type or #index:type, e.g. price:float64")
        })?;
        let datatype = ColumnType::from_str(datatype)?;
        let target = target.trim();
        ensure!(!target.is_empty(), "Override '{spec}' names no column");
        let target = if let Some(index) = target.strip_prefix('#') {
            let index: usize = index
                .parse()
                .with_context(|| format!("Parsing column index in '{spec}'"))?;
            ensure!(index >= 1, "Column indexes are 1-based in '{spec}'");
            OverrideTarget::Index(index - 1)
        } else {
            OverrideTarget::Name(target.to_string())
        };
        Ok(TypeOverride { target, datatype })
    }
}

#[derive(Debug, Clone)]
pub struct InferenceStats {
    sample_values: Vec<Option<String>>,
    rows_read: usize,
    requested_rows: usize,
    empty_lines: usize,
}

impl InferenceStats {
    pub fn sample_value(&self, index: usize) -> Option<&str> {
        self.sample_values
            .get(index)
            .and_then(|value| value.as_deref())
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn requested_rows(&self) -> usize {
        self.requested_rows
    }

    pub fn empty_lines(&self) -> usize {
        self.empty_lines
    }
}

#[derive(Default)]
struct InferState {
    acc: Vec<ColumnType>,
    samples: Vec<Option<String>>,
    rows_read: usize,
    empty_lines: usize,
    expected_width: Option<usize>,
}

impl InferState {
    fn fold_line(&mut self, line: &str, opts: &ScanOptions, flags: DetectFlags) -> Result<()> {
        if line.is_empty() {
            self.empty_lines += 1;
            if flags.skip_empty_lines() {
                return Ok(());
            }
        }
        let fields = split_line(line, opts);
        if flags.fixed_columns() {
            match self.expected_width {
                Some(width) => ensure!(
                    fields.len() == width,
                    "Data row {} has {} field(s) but the first data row has {width}",
                    self.rows_read + 1,
                    fields.len()
                ),
                None => self.expected_width = Some(fields.len()),
            }
        }
        if self.samples.len() < fields.len() {
            self.samples.resize(fields.len(), None);
        }
        for (idx, span) in fields.iter().enumerate() {
            if self.samples[idx].is_none() && !span.is_empty() {
                self.samples[idx] = Some((*span).to_string());
            }
        }
        let types: Vec<ColumnType> = fields
            .iter()
            .map(|span| classify_field(span, flags))
            .collect();
        self.acc = merge_types(&self.acc, &types);
        self.rows_read += 1;
        Ok(())
    }
}

fn limit_reached(rows_read: usize, sample_rows: usize) -> bool {
    sample_rows != 0 && rows_read >= sample_rows
}

/// Samples a line source and snapshots per-column types as a [`Schema`].
///
/// `sample_rows` bounds the number of data rows folded in; 0 means the
/// whole source. Columns that never saw evidence finalize as `string`.
pub fn infer_from_lines<I>(
    lines: I,
    opts: &ScanOptions,
    flags: DetectFlags,
    sample_rows: usize,
) -> Result<(Schema, InferenceStats)>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut iter = lines.into_iter();
    let mut state = InferState::default();

    // Empty lines ahead of the first content line can never be the header;
    // when kept they still fold in as data rows.
    let mut first = None;
    while !limit_reached(state.rows_read, sample_rows) {
        let Some(line) = iter.next() else { break };
        let line = line.context("Reading input line")?;
        if line.is_empty() {
            if flags.skip_empty_lines() {
                state.empty_lines += 1;
            } else {
                state.fold_line(&line, opts, flags)?;
            }
            continue;
        }
        first = Some(line);
        break;
    }

    let mut header: Option<Vec<String>> = None;
    let mut pending: VecDeque<String> = VecDeque::new();

    if let Some(first) = first {
        match flags.header_mode() {
            HeaderMode::HasHeader => header = Some(header_names(&first, opts)),
            HeaderMode::NoHeader => pending.push_back(first),
            HeaderMode::Detect => {
                pending.push_back(first);
                let mut sampled = 0usize;
                while sampled < HEADER_DETECTION_SAMPLE_ROWS {
                    let Some(line) = iter.next() else { break };
                    let line = line.context("Reading input line")?;
                    if line.is_empty() {
                        if flags.skip_empty_lines() {
                            state.empty_lines += 1;
                        } else {
                            pending.push_back(line);
                        }
                        continue;
                    }
                    sampled += 1;
                    pending.push_back(line);
                }
                let first_fields = owned_fields(&pending[0], opts);
                let others: Vec<Vec<String>> = pending
                    .iter()
                    .skip(1)
                    .filter(|line| !line.is_empty())
                    .map(|line| owned_fields(line, opts))
                    .collect();
                if infer_has_header(&first_fields, &others, flags) {
                    pending.pop_front();
                    header = Some(
                        first_fields
                            .iter()
                            .map(|name| name.trim().to_string())
                            .collect(),
                    );
                }
            }
        }
    }

    while !limit_reached(state.rows_read, sample_rows) {
        let line = match pending.pop_front() {
            Some(line) => line,
            None => match iter.next() {
                Some(line) => line.context("Reading input line")?,
                None => break,
            },
        };
        state.fold_line(&line, opts, flags)?;
    }

    let has_headers = header.is_some();
    let mut names = match header {
        Some(names) => names,
        None => generate_field_names(state.acc.len()),
    };
    for (idx, name) in names.iter_mut().enumerate() {
        if name.is_empty() {
            *name = format!("field_{idx}");
        }
    }
    while names.len() < state.acc.len() {
        names.push(format!("field_{}", names.len()));
    }
    while state.acc.len() < names.len() {
        state.acc.push(ColumnType::Unknown);
    }

    let unresolved = state
        .acc
        .iter()
        .filter(|ty| **ty == ColumnType::Unknown)
        .count();
    if unresolved > 0 {
        debug!("{unresolved} column(s) carried no evidence in the sample; defaulting to string");
    }

    let width = names.len();
    let columns: Vec<ColumnMeta> = names
        .into_iter()
        .zip(state.acc.iter())
        .map(|(name, ty)| ColumnMeta {
            name,
            datatype: match ty {
                ColumnType::Unknown => ColumnType::String,
                other => *other,
            },
        })
        .collect();

    state.samples.resize(width, None);
    let stats = InferenceStats {
        sample_values: state.samples,
        rows_read: state.rows_read,
        requested_rows: sample_rows,
        empty_lines: state.empty_lines,
    };
    let schema = Schema {
        columns,
        schema_version: None,
        has_headers,
    };
    debug!(
        "sampled {} data row(s) ({} empty) across {} column(s)",
        stats.rows_read,
        stats.empty_lines,
        schema.columns.len()
    );
    Ok((schema, stats))
}

/// Path-based entry point; `-` reads stdin.
pub fn infer_schema_with_stats(
    path: &Path,
    opts: &ScanOptions,
    flags: DetectFlags,
    sample_rows: usize,
    encoding: &'static Encoding,
) -> Result<(Schema, InferenceStats)> {
    let lines = io_utils::read_lines(path, encoding)?;
    infer_from_lines(lines, opts, flags, sample_rows)
}

pub fn infer_schema(
    path: &Path,
    opts: &ScanOptions,
    flags: DetectFlags,
    sample_rows: usize,
    encoding: &'static Encoding,
) -> Result<Schema> {
    infer_schema_with_stats(path, opts, flags, sample_rows, encoding)
        .map(|(schema, _stats)| schema)
}

fn generate_field_names(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("field_{idx}")).collect()
}

fn owned_fields(line: &str, opts: &ScanOptions) -> Vec<String> {
    split_line(line, opts)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn header_names(line: &str, opts: &ScanOptions) -> Vec<String> {
    split_line(line, opts)
        .into_iter()
        .map(|span| span.trim().to_string())
        .collect()
}

fn token_is_common_header(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if COMMON_HEADER_TOKENS
        .iter()
        .any(|token| normalized == *token)
    {
        return true;
    }
    let sanitized = normalized
        .chars()
        .map(|ch| match ch {
            ' ' | '-' | '/' => '_',
            other => other,
        })
        .collect::<String>();
    COMMON_HEADER_TOKENS
        .iter()
        .any(|token| sanitized.trim_matches('_') == *token)
}

fn value_is_data_like(value: &str, flags: DetectFlags) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if matches!(lowered.as_str(), "t" | "f" | "y" | "n") {
        return true;
    }
    !matches!(
        classify_field(trimmed, flags),
        ColumnType::String | ColumnType::Unknown
    )
}

fn value_is_header_like(value: &str, flags: DetectFlags) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    if value_is_data_like(trimmed, flags) {
        return false;
    }
    trimmed.chars().any(|c| c.is_ascii_alphabetic()) || token_is_common_header(trimmed)
}

fn header_tokens_match_dictionary(row: &[String]) -> bool {
    row.iter()
        .filter(|value| token_is_common_header(value.trim()))
        .count()
        >= 2
}

/// Decides whether the first sampled row is a header.
///
/// Per-column signals: a header-like first value above data-like evidence
/// counts toward a header; a data-like first value above data-like
/// evidence counts against. Ties fall back to the header token dictionary
/// and the overall header-like/data-like balance of the first row.
fn infer_has_header(first_row: &[String], other_rows: &[Vec<String>], flags: DetectFlags) -> bool {
    let header_like_first = first_row
        .iter()
        .filter(|value| value_is_header_like(value, flags))
        .count();
    let data_like_first = first_row
        .iter()
        .filter(|value| value_is_data_like(value, flags))
        .count();

    if header_like_first == 0 && data_like_first == 0 {
        return false;
    }
    if data_like_first > header_like_first {
        return false;
    }
    if other_rows.is_empty() {
        return header_like_first >= 2 || header_tokens_match_dictionary(first_row);
    }

    let mut header_signal = 0usize;
    let mut data_signal = 0usize;
    for column in 0..first_row.len() {
        let first_value = first_row.get(column).map(|s| s.as_str()).unwrap_or("");
        let first_is_header = value_is_header_like(first_value, flags);
        let first_is_data = value_is_data_like(first_value, flags);

        let other_has_data = other_rows
            .iter()
            .any(|row| row.get(column).is_some_and(|v| value_is_data_like(v, flags)));

        if first_is_header && other_has_data {
            header_signal += 1;
        } else if first_is_data && other_has_data {
            data_signal += 1;
        }
    }

    if header_signal > data_signal {
        return true;
    }
    if data_signal > header_signal {
        return false;
    }
    if header_tokens_match_dictionary(first_row) && header_like_first >= 1 {
        return true;
    }
    header_like_first > data_like_first
}
