//! Conversion between value kinds and backend bind/read calls.
//!
//! `encode` turns an application value into the representation a statement
//! binds; `decode` reads one position back through the typed getters of a
//! `ValueReader`. Both dispatch on `ValueKind` with exhaustive matches, so a new
//! kind cannot be added without handling it on both paths.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::kind::{Value, ValueKind};
use crate::backend::{BackendError, ValueReader};

/// A value in the form a backend statement binds.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Typed NULL for a nullable parameter.
    Null(ValueKind),
    Integer(i32),
    Decimal(Decimal),
    /// Text, including single characters sent as one-character strings.
    Text(String),
    Boolean(bool),
    Binary(Vec<u8>),
    Date(NaiveDate),
    /// Tabular parameter as a JSON array of row objects.
    Table { type_name: String, rows: JsonValue },
}

impl BoundValue {
    /// Kind this bound value was produced for.
    pub fn kind(&self) -> ValueKind {
        match self {
            BoundValue::Null(kind) => *kind,
            BoundValue::Integer(_) => ValueKind::Integer,
            BoundValue::Decimal(_) => ValueKind::DecimalText,
            BoundValue::Text(_) => ValueKind::Text,
            BoundValue::Boolean(_) => ValueKind::Boolean,
            BoundValue::Binary(_) => ValueKind::Binary,
            BoundValue::Date(_) => ValueKind::Date,
            BoundValue::Table { .. } => ValueKind::Table,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Missing value for non-nullable {kind} parameter")]
    IllegalNull { kind: ValueKind },

    #[error("Expected {kind} value, got {found}")]
    ShapeMismatch { kind: ValueKind, found: &'static str },

    #[error("'{text}' is not a decimal number")]
    MalformedDecimal { text: String },

    #[error("Backend returned empty text for a char value")]
    EmptyChar,

    #[error("{kind} values cannot be read from a routine result")]
    UnsupportedKind { kind: ValueKind },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CodecError {
    /// Errors that reveal a codec/descriptor defect rather than bad data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CodecError::UnsupportedKind { .. })
    }
}

/// Encode one parameter value for binding.
pub fn encode(
    kind: ValueKind,
    value: Option<&Value>,
    nullable: bool,
) -> Result<BoundValue, CodecError> {
    let Some(value) = value else {
        return if nullable {
            Ok(BoundValue::Null(kind))
        } else {
            Err(CodecError::IllegalNull { kind })
        };
    };

    let mismatch = || CodecError::ShapeMismatch {
        kind,
        found: value.type_name(),
    };

    match kind {
        ValueKind::Integer => match value {
            Value::Integer(i) => Ok(BoundValue::Integer(*i)),
            _ => Err(mismatch()),
        },
        ValueKind::DecimalText => match value {
            Value::Text(text) => parse_decimal(text).map(BoundValue::Decimal),
            Value::Decimal(d) => Ok(BoundValue::Decimal(*d)),
            _ => Err(mismatch()),
        },
        ValueKind::Text => match value {
            Value::Text(text) => Ok(BoundValue::Text(text.clone())),
            _ => Err(mismatch()),
        },
        ValueKind::SingleChar => match value {
            Value::Char(c) => Ok(BoundValue::Text(c.to_string())),
            _ => Err(mismatch()),
        },
        ValueKind::Boolean => match value {
            Value::Boolean(b) => Ok(BoundValue::Boolean(*b)),
            _ => Err(mismatch()),
        },
        ValueKind::Binary => match value {
            Value::Binary(bytes) => Ok(BoundValue::Binary(bytes.clone())),
            _ => Err(mismatch()),
        },
        ValueKind::Date => match value {
            Value::Date(d) => Ok(BoundValue::Date(*d)),
            _ => Err(mismatch()),
        },
        ValueKind::Table => match value {
            Value::Table(table) => Ok(BoundValue::Table {
                type_name: table.type_name().to_string(),
                rows: table.to_json(),
            }),
            _ => Err(mismatch()),
        },
    }
}

/// Decode the value at `position` as `kind`.
///
/// Backend NULL decodes to `None`, never to a zero or empty default.
pub fn decode<R>(kind: ValueKind, reader: &R, position: usize) -> Result<Option<Value>, CodecError>
where
    R: ValueReader + ?Sized,
{
    let value = match kind {
        ValueKind::Integer => reader.read_int(position)?.map(Value::Integer),
        ValueKind::DecimalText => reader.read_decimal(position)?.map(Value::Decimal),
        ValueKind::Text => reader.read_text(position)?.map(Value::Text),
        ValueKind::SingleChar => match reader.read_text(position)? {
            Some(text) => Some(Value::Char(text.chars().next().ok_or(CodecError::EmptyChar)?)),
            None => None,
        },
        ValueKind::Boolean => reader.read_bool(position)?.map(Value::Boolean),
        ValueKind::Binary => reader.read_bytes(position)?.map(Value::Binary),
        ValueKind::Date => reader.read_date(position)?.map(Value::Date),
        ValueKind::Table => return Err(CodecError::UnsupportedKind { kind }),
    };
    Ok(value)
}

fn parse_decimal(text: &str) -> Result<Decimal, CodecError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| CodecError::MalformedDecimal {
            text: text.to_string(),
        })
}
