//! Decoded column values
use std::fmt;

use chrono::{DateTime, FixedOffset};

/// One decoded column of a binary protocol row.
///
/// Values never borrow from the receive buffer; byte strings are copied out
/// so the buffer can be reused for the next row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Signed integer (TINYINT, SMALLINT, YEAR, MEDIUMINT, INT, BIGINT)
    SignedInt(i64),
    /// Unsigned integer (the same types with the UNSIGNED flag)
    UnsignedInt(u64),
    /// 4-byte floating point. The row decoder widens FLOAT columns to `Double`,
    /// this variant exists for values built by hand.
    Float(f32),
    /// FLOAT / DOUBLE
    Double(f64),
    /// DECIMAL, VARCHAR, CHAR, BLOB, ENUM, SET, BIT, GEOMETRY, ..
    Bytes(Vec<u8>),
    /// Textual DATE / DATETIME / TIMESTAMP (raw temporal mode) and TIME
    Text(String),
    /// DATE / DATETIME / TIMESTAMP in zoned temporal mode
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the byte payload of `Bytes` and `Text` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            Value::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::SignedInt(_) => "signed integer",
            Value::UnsignedInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::SignedInt(v) => write!(f, "{v}"),
            Value::UnsignedInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Text(text) => f.write_str(text),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::SignedInt(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UnsignedInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Bytes(text.as_bytes().to_vec())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;
