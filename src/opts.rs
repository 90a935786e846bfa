use std::str::FromStr;
use std::sync::Arc;

use chrono::FixedOffset;
use smart_default::SmartDefault;

use crate::buffer_pool::{BufferPool, GLOBAL_BUFFER_POOL};
use crate::error::Error;
use crate::protocol::temporal::{TemporalConfig, TemporalMode, TimeZone, ZeroDate};

/// Decoding options
///
/// ```rs
/// let mut opts1 = Opts::default();
/// opts1.parse_time = true;
///
/// let opts2 = Opts::try_from("mysql://localhost/shop?parseTime=true&loc=Local")?;
/// ```
#[derive(Debug, Clone, SmartDefault)]
pub struct Opts {
    /// Decode DATE/DATETIME/TIMESTAMP into calendar values in `loc` instead
    /// of `YYYY-MM-DD[ HH:MM:SS[.ffffff]]` text
    pub parse_time: bool,

    /// Time zone for calendar values. Only used with `parse_time`.
    pub loc: TimeZone,

    /// Representation of the all-zero date `0000-00-00`
    pub zero_date: ZeroDate,

    #[default(Arc::clone(&GLOBAL_BUFFER_POOL))]
    pub buffer_pool: Arc<BufferPool>,
}

impl Opts {
    /// Temporal settings for [`build_decode_plan`](crate::plan::build_decode_plan).
    pub fn temporal(&self) -> TemporalConfig {
        let mode = if self.parse_time {
            TemporalMode::Zoned(self.loc)
        } else {
            TemporalMode::Raw
        };
        TemporalConfig {
            mode,
            zero_date: self.zero_date,
        }
    }
}

/// Parse a boolean query value: `true`/`1` or `false`/`0`, case-insensitive.
fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Ok(false)
    } else {
        Err(Error::BadConfigError(format!(
            "Invalid boolean value '{value}' for parameter '{key}'"
        )))
    }
}

/// `UTC`, `Local`, or a fixed offset such as `+09:00` (percent-encode the `+`
/// as `%2B` inside a URL).
fn parse_loc(value: &str) -> Result<TimeZone, Error> {
    if value.eq_ignore_ascii_case("utc") {
        return Ok(TimeZone::Utc);
    }
    if value.eq_ignore_ascii_case("local") {
        return Ok(TimeZone::Local);
    }
    FixedOffset::from_str(value)
        .map(TimeZone::Fixed)
        .map_err(|e| Error::BadConfigError(format!("Invalid time zone '{value}' for 'loc': {e}")))
}

fn parse_zero_date(value: &str) -> Result<ZeroDate, Error> {
    if value.eq_ignore_ascii_case("null") {
        Ok(ZeroDate::Null)
    } else if value.eq_ignore_ascii_case("literal") {
        Ok(ZeroDate::Literal)
    } else {
        Err(Error::BadConfigError(format!(
            "Invalid value '{value}' for 'zeroDate', expected 'null' or 'literal'"
        )))
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    /// Parse decoding options from a MySQL URL.
    ///
    /// Host, credentials and database are accepted and ignored, as are query
    /// parameters that do not affect decoding.
    fn try_from(url: &str) -> Result<Self, Self::Error> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::BadConfigError(format!("Failed to parse MySQL URL: {}", e)))?;

        if parsed.scheme() != "mysql" {
            return Err(Error::BadConfigError(format!(
                "Invalid URL scheme '{}', expected 'mysql'",
                parsed.scheme()
            )));
        }

        let mut opts = Self::default();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "parseTime" => opts.parse_time = parse_bool(&key, &value)?,
                "loc" => opts.loc = parse_loc(&value)?,
                "zeroDate" => opts.zero_date = parse_zero_date(&value)?,
                other => tracing::trace!(parameter = other, "ignoring query parameter"),
            }
        }
        Ok(opts)
    }
}
