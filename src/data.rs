use std::fmt;

use anyhow::{Context, Result, bail, ensure};

use crate::schema::ColumnType;

/// A materialized cell, one variant per column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Int8(i) => i.to_string(),
            Value::UInt8(i) => i.to_string(),
            Value::Int16(i) => i.to_string(),
            Value::UInt16(i) => i.to_string(),
            Value::Int32(i) => i.to_string(),
            Value::UInt32(i) => i.to_string(),
            Value::Int64(i) => i.to_string(),
            Value::UInt64(i) => i.to_string(),
            Value::Float64(f) => {
                // i64::MAX as f64 rounds up to 2^63; strict < keeps the cast exact.
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::String(s) => s.clone(),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Int8(_) => ColumnType::Int8,
            Value::UInt8(_) => ColumnType::UInt8,
            Value::Int16(_) => ColumnType::Int16,
            Value::UInt16(_) => ColumnType::UInt16,
            Value::Int32(_) => ColumnType::Int32,
            Value::UInt32(_) => ColumnType::UInt32,
            Value::Int64(_) => ColumnType::Int64,
            Value::UInt64(_) => ColumnType::UInt64,
            Value::Float64(_) => ColumnType::Float64,
            Value::String(_) => ColumnType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// The value an empty field materializes as: zero for numerics, false for
/// booleans, the empty string for text.
pub fn default_value(ty: ColumnType) -> Result<Value> {
    let value = match ty {
        ColumnType::Boolean => Value::Boolean(false),
        ColumnType::Int8 => Value::Int8(0),
        ColumnType::UInt8 => Value::UInt8(0),
        ColumnType::Int16 => Value::Int16(0),
        ColumnType::UInt16 => Value::UInt16(0),
        ColumnType::Int32 => Value::Int32(0),
        ColumnType::UInt32 => Value::UInt32(0),
        ColumnType::Int64 => Value::Int64(0),
        ColumnType::UInt64 => Value::UInt64(0),
        ColumnType::Float64 => Value::Float64(0.0),
        ColumnType::String => Value::String(String::new()),
        ColumnType::Unknown => bail!("Unknown columns cannot materialize values"),
    };
    Ok(value)
}

fn parse_unsigned_literal(value: &str) -> Result<u64> {
    if let Some(rest) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        ensure!(
            !rest.is_empty() && !rest.starts_with(['+', '-']),
            "Failed to parse '{value}' as unsigned integer"
        );
        return u64::from_str_radix(rest, 16)
            .with_context(|| format!("Failed to parse '{value}' as unsigned integer"));
    }
    value
        .parse()
        .with_context(|| format!("Failed to parse '{value}' as unsigned integer"))
}

/// Parses one field against its column type.
///
/// Empty fields take the type's default. Unsigned columns accept hex
/// (`0x...`) as well as decimal literals.
pub fn parse_typed_value(value: &str, ty: ColumnType) -> Result<Value> {
    if value.is_empty() {
        return default_value(ty);
    }
    let parsed = match ty {
        ColumnType::String => Value::String(value.to_string()),
        ColumnType::Boolean => {
            let lowered = value.to_ascii_lowercase();
            let parsed = match lowered.as_str() {
                "true" | "t" | "yes" | "y" | "1" => true,
                "false" | "f" | "no" | "n" | "0" => false,
                _ => bail!("Failed to parse '{value}' as boolean"),
            };
            Value::Boolean(parsed)
        }
        ColumnType::Int8 => Value::Int8(
            value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as int8"))?,
        ),
        ColumnType::Int16 => Value::Int16(
            value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as int16"))?,
        ),
        ColumnType::Int32 => Value::Int32(
            value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as int32"))?,
        ),
        ColumnType::Int64 => Value::Int64(
            value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as int64"))?,
        ),
        ColumnType::UInt8 => {
            let wide = parse_unsigned_literal(value)?;
            Value::UInt8(
                u8::try_from(wide)
                    .with_context(|| format!("Value '{value}' does not fit uint8"))?,
            )
        }
        ColumnType::UInt16 => {
            let wide = parse_unsigned_literal(value)?;
            Value::UInt16(
                u16::try_from(wide)
                    .with_context(|| format!("Value '{value}' does not fit uint16"))?,
            )
        }
        ColumnType::UInt32 => {
            let wide = parse_unsigned_literal(value)?;
            Value::UInt32(
                u32::try_from(wide)
                    .with_context(|| format!("Value '{value}' does not fit uint32"))?,
            )
        }
        ColumnType::UInt64 => Value::UInt64(parse_unsigned_literal(value)?),
        ColumnType::Float64 => Value::Float64(
            value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float64"))?,
        ),
        ColumnType::Unknown => bail!("Unknown columns cannot materialize values"),
    };
    Ok(parsed)
}
