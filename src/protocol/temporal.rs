//! DATE / DATETIME / TIMESTAMP / TIME binary payloads.
//!
//! Every temporal value starts with a length-encoded length byte followed by
//! that many payload bytes:
//!
//! ```text
//! DATE/DATETIME/TIMESTAMP  len = 0 | 4 | 7 | 11
//!   year(2 LE) month(1) day(1) [hour(1) minute(1) second(1) [micro(4 LE)]]
//! TIME                     len = 0 | 8 | 12
//!   is_negative(1) days(4 LE) hour(1) minute(1) second(1) [micro(4 LE)]
//! ```
//!
//! Dates are rendered either as fixed-format text (raw mode) or as calendar
//! values attached to a configured time zone (zoned mode). TIME is always text.

use std::fmt;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset as _, TimeZone as _, Utc,
};
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::{Error, Result, eyre};
use crate::protocol::cursor::ByteCursor;
use crate::protocol::primitive::{LengthEncoded, read_int_lenenc};
use crate::value::Value;

// ============================================================================
// Configuration
// ============================================================================

/// Time zone attached to calendar values in zoned mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl TimeZone {
    /// Interpret a wall-clock time in this zone.
    ///
    /// Ambiguous local times resolve to the earlier instant. Times that do not
    /// exist in the zone (DST gaps) are an error.
    pub fn resolve(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        match self {
            TimeZone::Utc => Ok(Utc.from_utc_datetime(&naive).with_timezone(&Utc.fix())),
            TimeZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix()))
                .ok_or_else(|| {
                    Error::InvalidCalendarValue(format!("{naive} does not exist in local time"))
                }),
            TimeZone::Fixed(offset) => offset.from_local_datetime(&naive).single().ok_or_else(|| {
                Error::InvalidCalendarValue(format!("{naive} does not exist at offset {offset}"))
            }),
        }
    }
}

/// How a zero-length DATE/DATETIME payload (`0000-00-00`) is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDate {
    /// Decode as `Value::Null`.
    #[default]
    Null,
    /// Raw mode: `0000-00-00` / `0000-00-00 00:00:00`.
    /// Zoned mode: `0001-01-01T00:00:00Z`, the earliest calendar instant.
    Literal,
}

/// Raw text or zoned calendar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemporalMode {
    #[default]
    Raw,
    Zoned(TimeZone),
}

/// Temporal decoding settings, fixed for the lifetime of a decode plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TemporalConfig {
    pub mode: TemporalMode,
    pub zero_date: ZeroDate,
}

impl TemporalConfig {
    pub fn raw() -> Self {
        Self::default()
    }

    pub fn zoned(zone: TimeZone) -> Self {
        Self {
            mode: TemporalMode::Zoned(zone),
            zero_date: ZeroDate::Null,
        }
    }

    pub fn with_zero_date(mut self, zero_date: ZeroDate) -> Self {
        self.zero_date = zero_date;
        self
    }
}

// ============================================================================
// Wire layouts
// ============================================================================

/// DATE/DATETIME/TIMESTAMP - 4 bytes (ymd)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp4 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
}

/// DATE/DATETIME/TIMESTAMP - 7 bytes (ymd + hms)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp7 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// DATE/DATETIME/TIMESTAMP - 11 bytes (ymd + hms + microseconds)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Timestamp11 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

/// TIME - 8 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Time8 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// TIME - 12 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct Time12 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

fn cast<'a, T: FromBytes + KnownLayout + Immutable>(bytes: &'a [u8]) -> Result<&'a T> {
    T::ref_from_bytes(bytes).map_err(Error::from_debug)
}

// ============================================================================
// DATE / DATETIME / TIMESTAMP
// ============================================================================

/// Calendar components of a DATE/DATETIME/TIMESTAMP payload.
///
/// Fields absent from a short payload are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeParts {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
    /// Payload length: 4, 7 or 11.
    pub len: u8,
}

impl From<&Timestamp4> for DateTimeParts {
    fn from(ts: &Timestamp4) -> Self {
        Self {
            year: ts.year.get(),
            month: ts.month,
            day: ts.day,
            len: 4,
            ..Self::default()
        }
    }
}

impl From<&Timestamp7> for DateTimeParts {
    fn from(ts: &Timestamp7) -> Self {
        Self {
            year: ts.year.get(),
            month: ts.month,
            day: ts.day,
            hour: ts.hour,
            minute: ts.minute,
            second: ts.second,
            microsecond: 0,
            len: 7,
        }
    }
}

impl From<&Timestamp11> for DateTimeParts {
    fn from(ts: &Timestamp11) -> Self {
        Self {
            year: ts.year.get(),
            month: ts.month,
            day: ts.day,
            hour: ts.hour,
            minute: ts.minute,
            second: ts.second,
            microsecond: ts.microsecond.get(),
            len: 11,
        }
    }
}

impl DateTimeParts {
    /// `YYYY-MM-DD`
    pub fn format_date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// `YYYY-MM-DD HH:MM:SS[.ffffff]`, with fractional seconds only when the
    /// payload carried them.
    pub fn format_datetime(&self) -> String {
        let mut out = format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );
        if self.len == 11 {
            out.push_str(&format!(".{:06}", self.microsecond));
        }
        out
    }

    pub fn to_naive_date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .ok_or_else(|| Error::InvalidCalendarValue(self.format_date()))
    }

    pub fn to_naive_datetime(&self) -> Result<NaiveDateTime> {
        self.to_naive_date()?
            .and_hms_micro_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
                self.microsecond,
            )
            .ok_or_else(|| Error::InvalidCalendarValue(self.format_datetime()))
    }
}

impl fmt::Display for DateTimeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_datetime())
    }
}

/// A DATE/DATETIME/TIMESTAMP payload before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimePayload {
    /// Length-encoded NULL marker.
    Null,
    /// Zero-length payload (`0000-00-00 00:00:00`).
    Zero,
    Parts(DateTimeParts),
}

/// Read a DATE/DATETIME/TIMESTAMP payload, advancing the cursor only on success.
pub fn read_datetime_payload(cursor: &mut ByteCursor<'_>) -> Result<DateTimePayload> {
    let mut probe = *cursor;
    let payload = match read_int_lenenc(&mut probe)? {
        LengthEncoded::Null => DateTimePayload::Null,
        LengthEncoded::Value(0) => DateTimePayload::Zero,
        LengthEncoded::Value(4) => {
            DateTimePayload::Parts(cast::<Timestamp4>(probe.read_bytes(4)?)?.into())
        }
        LengthEncoded::Value(7) => {
            DateTimePayload::Parts(cast::<Timestamp7>(probe.read_bytes(7)?)?.into())
        }
        LengthEncoded::Value(11) => {
            DateTimePayload::Parts(cast::<Timestamp11>(probe.read_bytes(11)?)?.into())
        }
        LengthEncoded::Value(len) => return Err(Error::InvalidDateTimePacketLength(len)),
    };
    *cursor = probe;
    Ok(payload)
}

/// Earliest representable calendar instant, used for zero dates in zoned mode.
fn zero_instant() -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::LibraryBug(eyre!("0001-01-01 is out of range")))?;
    TimeZone::Utc.resolve(naive)
}

fn render_zero(config: &TemporalConfig, literal: &str) -> Result<Value> {
    Ok(match (config.zero_date, config.mode) {
        (ZeroDate::Null, _) => Value::Null,
        (ZeroDate::Literal, TemporalMode::Raw) => Value::Text(literal.to_owned()),
        (ZeroDate::Literal, TemporalMode::Zoned(_)) => Value::DateTime(zero_instant()?),
    })
}

/// Decode a DATE/NEWDATE value. Time-of-day components, if present, are dropped.
pub fn decode_date(cursor: &mut ByteCursor<'_>, config: &TemporalConfig) -> Result<Value> {
    let parts = match read_datetime_payload(cursor)? {
        DateTimePayload::Null => return Ok(Value::Null),
        DateTimePayload::Zero => return render_zero(config, "0000-00-00"),
        DateTimePayload::Parts(parts) => parts,
    };
    match config.mode {
        TemporalMode::Raw => Ok(Value::Text(parts.format_date())),
        TemporalMode::Zoned(zone) => {
            let midnight = parts
                .to_naive_date()?
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| Error::InvalidCalendarValue(parts.format_date()))?;
            Ok(Value::DateTime(zone.resolve(midnight)?))
        }
    }
}

/// Decode a DATETIME/TIMESTAMP value.
pub fn decode_datetime(cursor: &mut ByteCursor<'_>, config: &TemporalConfig) -> Result<Value> {
    let parts = match read_datetime_payload(cursor)? {
        DateTimePayload::Null => return Ok(Value::Null),
        DateTimePayload::Zero => return render_zero(config, "0000-00-00 00:00:00"),
        DateTimePayload::Parts(parts) => parts,
    };
    match config.mode {
        TemporalMode::Raw => Ok(Value::Text(parts.format_datetime())),
        TemporalMode::Zoned(zone) => Ok(Value::DateTime(zone.resolve(parts.to_naive_datetime()?)?)),
    }
}

// ============================================================================
// TIME
// ============================================================================

/// Components of a TIME payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeParts {
    pub is_negative: bool,
    pub days: u32,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// `Some` only for 12-byte payloads.
    pub microsecond: Option<u32>,
}

impl From<&Time8> for TimeParts {
    fn from(time: &Time8) -> Self {
        Self {
            is_negative: time.is_negative == 1,
            days: time.days.get(),
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            microsecond: None,
        }
    }
}

impl From<&Time12> for TimeParts {
    fn from(time: &Time12) -> Self {
        Self {
            is_negative: time.is_negative == 1,
            days: time.days.get(),
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            microsecond: Some(time.microsecond.get()),
        }
    }
}

impl TimeParts {
    pub fn total_hours(&self) -> u64 {
        u64::from(self.days) * 24 + u64::from(self.hour)
    }
}

impl fmt::Display for TimeParts {
    /// `[-]HH:MM:SS[.ffffff]`. Hours have at least two digits and may have more.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative {
            f.write_str("-")?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.total_hours(),
            self.minute,
            self.second
        )?;
        if let Some(micro) = self.microsecond {
            write!(f, ".{micro:06}")?;
        }
        Ok(())
    }
}

/// Decode a TIME value into `[-]HH:MM:SS[.ffffff]`.
///
/// NULL marker yields `Null`, a zero-length payload yields `00:00:00`, and any
/// length other than 0, 8 or 12 is `InvalidTimePacketLength`. The server clamps
/// TIME to its supported range, so only the structure is checked here.
pub fn decode_time(cursor: &mut ByteCursor<'_>) -> Result<Value> {
    let mut probe = *cursor;
    let parts = match read_int_lenenc(&mut probe)? {
        LengthEncoded::Null => {
            *cursor = probe;
            return Ok(Value::Null);
        }
        LengthEncoded::Value(0) => {
            *cursor = probe;
            return Ok(Value::Text("00:00:00".to_owned()));
        }
        LengthEncoded::Value(8) => TimeParts::from(cast::<Time8>(probe.read_bytes(8)?)?),
        LengthEncoded::Value(12) => TimeParts::from(cast::<Time12>(probe.read_bytes(12)?)?),
        LengthEncoded::Value(len) => return Err(Error::InvalidTimePacketLength(len)),
    };
    *cursor = probe;
    Ok(Value::Text(parts.to_string()))
}

#[cfg(test)]
#[path = "temporal_test.rs"]
mod temporal_test;
