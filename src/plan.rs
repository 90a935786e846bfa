//! Per-result-set decode plans.
//!
//! Column types are resolved to a [`ColumnDecoder`] once, when the result set
//! is opened. Every row of that result set is then decoded by walking the same
//! plan, without looking at type tags again.

use crate::constant::ColumnType;
use crate::error::{Error, Result};
use crate::protocol::column::ColumnDescriptor;
use crate::protocol::cursor::ByteCursor;
use crate::protocol::primitive::read_bytes_lenenc;
use crate::protocol::temporal::{TemporalConfig, decode_date, decode_datetime, decode_time};
use crate::value::Value;

/// Decoder bound to one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDecoder {
    /// MYSQL_TYPE_NULL: no payload
    Null,
    /// TINYINT
    Int8,
    /// TINYINT UNSIGNED
    UInt8,
    /// SMALLINT, YEAR
    Int16,
    /// SMALLINT UNSIGNED, YEAR UNSIGNED
    UInt16,
    /// MEDIUMINT, INT (both sent as 4 bytes)
    Int32,
    /// MEDIUMINT UNSIGNED, INT UNSIGNED
    UInt32,
    /// BIGINT
    Int64,
    /// BIGINT UNSIGNED
    UInt64,
    /// FLOAT, widened to `Value::Double`
    Float32,
    /// DOUBLE
    Float64,
    /// DECIMAL, strings, BLOBs, BIT, ENUM, SET, GEOMETRY
    LengthEncoded,
    /// DATE, NEWDATE
    Date(TemporalConfig),
    /// DATETIME, TIMESTAMP
    DateTime(TemporalConfig),
    /// TIME
    Time,
}

impl ColumnDecoder {
    /// Select the decoder for a column.
    ///
    /// `index` is the column's position in the result set and is only used for
    /// error reporting.
    pub fn for_column(
        column: &ColumnDescriptor,
        index: usize,
        temporal: &TemporalConfig,
    ) -> Result<Self> {
        let unknown = || Error::UnknownFieldType {
            field_type: column.column_type,
            column: index,
        };
        let signed_or_unsigned = |signed, unsigned| {
            if column.unsigned { unsigned } else { signed }
        };

        let column_type = column.known_type().ok_or_else(unknown)?;
        let decoder = match column_type {
            ColumnType::MYSQL_TYPE_NULL => ColumnDecoder::Null,

            ColumnType::MYSQL_TYPE_TINY => signed_or_unsigned(Self::Int8, Self::UInt8),
            ColumnType::MYSQL_TYPE_SHORT | ColumnType::MYSQL_TYPE_YEAR => {
                signed_or_unsigned(Self::Int16, Self::UInt16)
            }
            ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => {
                signed_or_unsigned(Self::Int32, Self::UInt32)
            }
            ColumnType::MYSQL_TYPE_LONGLONG => signed_or_unsigned(Self::Int64, Self::UInt64),

            ColumnType::MYSQL_TYPE_FLOAT => ColumnDecoder::Float32,
            ColumnType::MYSQL_TYPE_DOUBLE => ColumnDecoder::Float64,

            ColumnType::MYSQL_TYPE_DECIMAL
            | ColumnType::MYSQL_TYPE_NEWDECIMAL
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_BIT
            | ColumnType::MYSQL_TYPE_ENUM
            | ColumnType::MYSQL_TYPE_SET
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_GEOMETRY => ColumnDecoder::LengthEncoded,

            ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
                ColumnDecoder::Date(*temporal)
            }
            ColumnType::MYSQL_TYPE_TIME => ColumnDecoder::Time,
            ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_DATETIME => {
                ColumnDecoder::DateTime(*temporal)
            }

            // Server-internal types that never appear in binary rows sent to
            // clients, and JSON which this decoder does not handle.
            ColumnType::MYSQL_TYPE_TIMESTAMP2
            | ColumnType::MYSQL_TYPE_DATETIME2
            | ColumnType::MYSQL_TYPE_TIME2
            | ColumnType::MYSQL_TYPE_TYPED_ARRAY
            | ColumnType::MYSQL_TYPE_JSON => return Err(unknown()),
        };
        Ok(decoder)
    }

    /// Decode the value at `data[pos..]` into `dest` and return the number of
    /// bytes consumed. On error `dest` is left unchanged.
    pub fn decode(&self, dest: &mut Value, data: &[u8], pos: usize) -> Result<usize> {
        let mut cursor = ByteCursor::at(data, pos);
        let value = match self {
            ColumnDecoder::Null => Value::Null,
            ColumnDecoder::Int8 => {
                Value::SignedInt(i64::from(i8::from_le_bytes(cursor.read_array()?)))
            }
            ColumnDecoder::UInt8 => Value::UnsignedInt(u64::from(cursor.read_u8()?)),
            ColumnDecoder::Int16 => {
                Value::SignedInt(i64::from(i16::from_le_bytes(cursor.read_array()?)))
            }
            ColumnDecoder::UInt16 => Value::UnsignedInt(u64::from(cursor.read_u16_le()?)),
            ColumnDecoder::Int32 => {
                Value::SignedInt(i64::from(i32::from_le_bytes(cursor.read_array()?)))
            }
            ColumnDecoder::UInt32 => Value::UnsignedInt(u64::from(cursor.read_u32_le()?)),
            ColumnDecoder::Int64 => Value::SignedInt(i64::from_le_bytes(cursor.read_array()?)),
            ColumnDecoder::UInt64 => Value::UnsignedInt(cursor.read_u64_le()?),
            ColumnDecoder::Float32 => {
                Value::Double(f64::from(f32::from_le_bytes(cursor.read_array()?)))
            }
            ColumnDecoder::Float64 => Value::Double(f64::from_le_bytes(cursor.read_array()?)),
            ColumnDecoder::LengthEncoded => {
                read_bytes_lenenc(&mut cursor)?.map_or(Value::Null, Value::from)
            }
            ColumnDecoder::Date(temporal) => decode_date(&mut cursor, temporal)?,
            ColumnDecoder::DateTime(temporal) => decode_datetime(&mut cursor, temporal)?,
            ColumnDecoder::Time => decode_time(&mut cursor)?,
        };
        *dest = value;
        Ok(cursor.position() - pos)
    }
}

/// Ordered column decoders for one result set. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodePlan {
    decoders: Box<[ColumnDecoder]>,
    temporal: TemporalConfig,
}

impl DecodePlan {
    pub fn decoders(&self) -> &[ColumnDecoder] {
        &self.decoders
    }

    pub fn temporal(&self) -> &TemporalConfig {
        &self.temporal
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Resolve every column to its decoder.
///
/// Fails with `UnknownFieldType` on the first column whose type cannot be
/// decoded; no plan is produced in that case.
pub fn build_decode_plan(
    columns: &[ColumnDescriptor],
    temporal: &TemporalConfig,
) -> Result<DecodePlan> {
    let decoders = columns
        .iter()
        .enumerate()
        .map(|(index, column)| ColumnDecoder::for_column(column, index, temporal))
        .collect::<Result<Box<[_]>>>()?;
    tracing::debug!(columns = decoders.len(), ?temporal, "decode plan built");
    Ok(DecodePlan {
        decoders,
        temporal: *temporal,
    })
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
