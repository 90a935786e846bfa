//! Conversions from decoded [`Value`]s into application types.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use simdutf8::basic::from_utf8;

use crate::error::{Error, Result, eyre};
use crate::value::Value;

/// Trait for types that can be extracted from a decoded column value.
///
/// Implementations return `BadUsageError` for unsupported conversions and for
/// values that do not fit the target type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::BadUsageError(format!(
        "Cannot decode {} to {}",
        value.kind(),
        std::any::type_name::<T>()
    ))
}

fn out_of_range<T>(value: impl std::fmt::Display, reason: impl std::fmt::Display) -> Error {
    Error::BadUsageError(format!(
        "Value {} is out of range for {}: {}",
        value,
        std::any::type_name::<T>(),
        reason
    ))
}

fn utf8<T>(bytes: &[u8]) -> Result<&str> {
    from_utf8(bytes).map_err(|e| {
        Error::BadUsageError(format!(
            "Cannot decode bytes to {}: {}",
            std::any::type_name::<T>(),
            e
        ))
    })
}

// ============================================================================
// FromValue implementations for primitive types
// ============================================================================

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

macro_rules! impl_from_value_int {
    ($($T:ty),+) => {
        $(
            impl FromValue for $T {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::SignedInt(v) => {
                            <$T>::try_from(v).map_err(|e| out_of_range::<$T>(v, e))
                        }
                        Value::UnsignedInt(v) => {
                            <$T>::try_from(v).map_err(|e| out_of_range::<$T>(v, e))
                        }
                        other => Err(mismatch::<$T>(&other)),
                    }
                }
            }
        )+
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::SignedInt(v) => Ok(v != 0),
            Value::UnsignedInt(v) => Ok(v != 0),
            other => Err(mismatch::<bool>(&other)),
        }
    }
}

impl FromValue for f32 {
    /// FLOAT columns are widened to `Double` by the row decoder; narrowing back
    /// is exact for them.
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Double(v) => Ok(v as f32),
            other => Err(mismatch::<f32>(&other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(f64::from(v)),
            Value::Double(v) => Ok(v),
            other => Err(mismatch::<f64>(&other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            other => Err(mismatch::<Vec<u8>>(&other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(utf8::<String>(&v)?.to_owned()),
            Value::Text(v) => Ok(v),
            other => Err(mismatch::<String>(&other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ============================================================================
// Temporal types
// ============================================================================

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    /// Accepts zoned values (wall-clock time in their zone) and raw
    /// `YYYY-MM-DD[ HH:MM:SS[.ffffff]]` text.
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v.naive_local()),
            Value::Text(text) => {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT) {
                    return Ok(datetime);
                }
                NaiveDate::parse_from_str(&text, DATE_FORMAT)
                    .map_err(|e| Error::InvalidCalendarValue(format!("{text}: {e}")))?
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| Error::InvalidCalendarValue(text.clone()))
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for NaiveDate {
    /// Accepts zoned values (date in their zone) and raw text; any
    /// time-of-day part of the text is ignored.
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v.date_naive()),
            Value::Text(text) => {
                let date = text.get(..10).unwrap_or(&text);
                NaiveDate::parse_from_str(date, DATE_FORMAT)
                    .map_err(|e| Error::InvalidCalendarValue(format!("{text}: {e}")))
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(feature = "with-time")]
impl FromValue for time::OffsetDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => {
                let nanos = v.timestamp_nanos_opt().ok_or_else(|| {
                    out_of_range::<Self>(v, "outside the nanosecond timestamp range")
                })?;
                let offset = time::UtcOffset::from_whole_seconds(v.offset().local_minus_utc())
                    .map_err(|e| Error::LibraryBug(eyre!("{e}")))?;
                time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
                    .map(|utc| utc.to_offset(offset))
                    .map_err(|e| out_of_range::<Self>(v, e))
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(feature = "with-rust-decimal")]
impl FromValue for rust_decimal::Decimal {
    /// DECIMAL columns arrive as their textual representation.
    fn from_value(value: Value) -> Result<Self> {
        use std::str::FromStr;

        match value {
            Value::Bytes(v) => {
                let text = utf8::<Self>(&v)?;
                rust_decimal::Decimal::from_str(text).map_err(|e| {
                    Error::BadUsageError(format!("Cannot decode '{text}' to Decimal: {e}"))
                })
            }
            Value::SignedInt(v) => Ok(Self::from(v)),
            Value::UnsignedInt(v) => Ok(Self::from(v)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

// ============================================================================
// FromRow
// ============================================================================

/// Trait for types that can be built from a decoded row.
pub trait FromRow: Sized {
    fn from_row(values: Vec<Value>) -> Result<Self>;
}

impl FromRow for Vec<Value> {
    fn from_row(values: Vec<Value>) -> Result<Self> {
        Ok(values)
    }
}

fn check_row_width<T>(values: &[Value], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(Error::BadUsageError(format!(
            "Cannot decode a row of {} columns to {}",
            values.len(),
            std::any::type_name::<T>()
        )));
    }
    Ok(())
}

fn next_column<T: FromValue>(
    values: &mut std::vec::IntoIter<Value>,
    column: usize,
) -> Result<T> {
    let value = values
        .next()
        .ok_or_else(|| Error::LibraryBug(eyre!("row ended before column {column}")))?;
    T::from_value(value).map_err(|e| e.in_column(column))
}

macro_rules! impl_from_row_tuple {
    ($len:literal; $($idx:tt: $T:ident),+) => {
        impl<$($T: FromValue),+> FromRow for ($($T,)+) {
            fn from_row(values: Vec<Value>) -> Result<Self> {
                check_row_width::<Self>(&values, $len)?;
                let mut values = values.into_iter();
                Ok(($(next_column::<$T>(&mut values, $idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(1; 0: A);
impl_from_row_tuple!(2; 0: A, 1: B);
impl_from_row_tuple!(3; 0: A, 1: B, 2: C);
impl_from_row_tuple!(4; 0: A, 1: B, 2: C, 3: D);
impl_from_row_tuple!(5; 0: A, 1: B, 2: C, 3: D, 4: E);
impl_from_row_tuple!(6; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F);
impl_from_row_tuple!(7; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G);
impl_from_row_tuple!(8; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H);
impl_from_row_tuple!(9; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I);
impl_from_row_tuple!(10; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J);
impl_from_row_tuple!(11; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K);
impl_from_row_tuple!(12; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K, 11: L);
