//! Row materialization against a schema snapshot.
//!
//! [`parse_typed_row()`] converts one split row into typed [`Value`] cells
//! using the schema's column types. Missing trailing fields materialize the
//! same way empty ones do: as the column type's default.

use anyhow::{Context, Result};

use crate::{
    data::{Value, parse_typed_value},
    schema::Schema,
};

pub fn parse_typed_row(schema: &Schema, raw: &[&str]) -> Result<Vec<Value>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = raw.get(idx).copied().unwrap_or("");
            parse_typed_value(value, column.datatype)
                .with_context(|| format!("Column '{}' (#{})", column.name, idx + 1))
        })
        .collect()
}
