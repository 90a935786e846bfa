//! Decoding of MySQL binary-protocol rows through per-result-set decode plans,
//! with explicit ownership tracking for the receive buffer rows are read into.

pub mod buffer;
pub mod buffer_pool;
pub mod conn;
pub mod constant;
pub mod decode;
pub mod error;
pub mod from_value;
pub mod lease;
pub mod log;
mod opts;
pub mod plan;
pub mod protocol;
pub mod value;

pub use conn::{Connection, ResultSet, RowEvent, RowFraming, RowSource};
pub use decode::{decode_binary_row, decode_binary_row_into, decode_row, decode_row_into};
pub use error::{Error, Result};
pub use from_value::{FromRow, FromValue};
pub use lease::{BufferId, BufferTracker, OperationId};
pub use log::{Logger, NoopLogger, TracingLogger};
pub use opts::Opts;
pub use plan::{ColumnDecoder, DecodePlan, build_decode_plan};
pub use protocol::column::ColumnDescriptor;
pub use protocol::temporal::{TemporalConfig, TemporalMode, TimeZone, ZeroDate};
pub use value::Value;

#[cfg(test)]
mod buffer_test;
#[cfg(test)]
mod opts_test;
