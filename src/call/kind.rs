//! Value kinds and the application-level values exchanged with routines.
//!
//! `ValueKind` is the closed set of semantic categories a routine parameter or
//! return column can have. `Value` is what business code hands to the executor
//! and what it gets back. Backend NULL is never a `Value`; it is the `None` of
//! an `Option<Value>`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use super::table::TableSnapshot;

/// Date format used when values cross a text boundary (JSON, CLI, output).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Semantic category of a routine parameter or return column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    /// Exact decimal, supplied by callers as text so parsing is centralized.
    DecimalText,
    Text,
    SingleChar,
    Boolean,
    Binary,
    Date,
    /// A whole row-set supplied as one parameter. Never readable back.
    Table,
}

impl ValueKind {
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Integer,
        ValueKind::DecimalText,
        ValueKind::Text,
        ValueKind::SingleChar,
        ValueKind::Boolean,
        ValueKind::Binary,
        ValueKind::Date,
        ValueKind::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::DecimalText => "decimal",
            ValueKind::Text => "text",
            ValueKind::SingleChar => "char",
            ValueKind::Boolean => "boolean",
            ValueKind::Binary => "binary",
            ValueKind::Date => "date",
            ValueKind::Table => "table",
        }
    }

    /// Whether values of this kind can be decoded from a backend result.
    pub fn is_readable(&self) -> bool {
        !matches!(self, ValueKind::Table)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown value kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ValueKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// An application-level value passed to or returned from a routine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Decimal(Decimal),
    Text(String),
    Char(char),
    Boolean(bool),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Table(TableSnapshot),
}

/// Errors converting JSON input into a `Value` of a declared kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonValueError {
    #[error("Expected {kind} value, got {found}")]
    WrongType { kind: ValueKind, found: String },

    #[error("Integer {value} does not fit in 32 bits")]
    IntegerRange { value: String },

    #[error("Invalid {kind} value '{text}'")]
    Malformed { kind: ValueKind, text: String },

    #[error("Table values cannot be supplied as JSON")]
    TableNotSupported,
}

impl Value {
    /// Name of the runtime shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Char(_) => "char",
            Value::Boolean(_) => "boolean",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Table(_) => "table",
        }
    }

    /// Convert a JSON value to a `Value` of the given kind.
    ///
    /// JSON `null` maps to `None`. Decimal input stays text (or a JSON number
    /// rendered as text) so that the codec performs the one authoritative
    /// parse at bind time. Binary input is hex; dates are `YYYY-MM-DD`.
    pub fn from_json(kind: ValueKind, json: &JsonValue) -> Result<Option<Value>, JsonValueError> {
        if json.is_null() {
            return Ok(None);
        }

        let wrong_type = || JsonValueError::WrongType {
            kind,
            found: json_type_name(json).to_string(),
        };

        let value = match kind {
            ValueKind::Integer => {
                let n = json.as_i64().ok_or_else(wrong_type)?;
                let n = i32::try_from(n).map_err(|_| JsonValueError::IntegerRange {
                    value: n.to_string(),
                })?;
                Value::Integer(n)
            }
            ValueKind::DecimalText => match json {
                JsonValue::String(s) => Value::Text(s.clone()),
                JsonValue::Number(n) => Value::Text(n.to_string()),
                _ => return Err(wrong_type()),
            },
            ValueKind::Text => Value::Text(json.as_str().ok_or_else(wrong_type)?.to_string()),
            ValueKind::SingleChar => {
                let s = json.as_str().ok_or_else(wrong_type)?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => {
                        return Err(JsonValueError::Malformed {
                            kind,
                            text: s.to_string(),
                        });
                    }
                }
            }
            ValueKind::Boolean => Value::Boolean(json.as_bool().ok_or_else(wrong_type)?),
            ValueKind::Binary => {
                let s = json.as_str().ok_or_else(wrong_type)?;
                let bytes = hex::decode(s).map_err(|_| JsonValueError::Malformed {
                    kind,
                    text: s.to_string(),
                })?;
                Value::Binary(bytes)
            }
            ValueKind::Date => {
                let s = json.as_str().ok_or_else(wrong_type)?;
                let date = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
                    JsonValueError::Malformed {
                        kind,
                        text: s.to_string(),
                    }
                })?;
                Value::Date(date)
            }
            ValueKind::Table => return Err(JsonValueError::TableNotSupported),
        };

        Ok(Some(value))
    }

    /// JSON rendering used for output and for tabular parameter encoding.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Integer(i) => json!(i),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Char(c) => JsonValue::String(c.to_string()),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Binary(bytes) => JsonValue::String(hex::encode(bytes)),
            Value::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
            Value::Table(table) => table.to_json(),
        }
    }
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{c}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Binary(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Table(table) => write!(f, "<{} rows of {}>", table.len(), table.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<TableSnapshot> for Value {
    fn from(value: TableSnapshot) -> Self {
        Value::Table(value)
    }
}
