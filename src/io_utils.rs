//! I/O utilities for encoded line reading.
//!
//! All input in csv-probe flows through [`read_lines()`]: the file (or
//! stdin via the `-` path convention) is decoded from its source encoding
//! to UTF-8 with `encoding_rs_io`, then split into lines. Both `\n` and
//! `\r\n` terminate a line.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

const COMMON_ENCODING_LABELS: &[&str] = &[
    "utf-8",
    "utf-16le",
    "utf-16be",
    "windows-1252",
    "latin1",
    "shift_jis",
    "gbk",
];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes()).ok_or_else(|| {
            anyhow!(
                "Unknown encoding '{value}'. Common labels: {}",
                COMMON_ENCODING_LABELS.join(", ")
            )
        })
    } else {
        Ok(UTF_8)
    }
}

/// Opens `path` (or stdin for `-`) and yields UTF-8 lines decoded from
/// `encoding`. Malformed sequences decode as replacement characters.
pub fn read_lines(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<impl Iterator<Item = io::Result<String>>> {
    let raw: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?)
    };
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(raw);
    Ok(BufReader::new(decoded).lines())
}
