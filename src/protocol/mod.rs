pub mod column;
pub mod cursor;
pub mod primitive;
pub mod row;
pub mod temporal;

pub use column::{ColumnDefinition, ColumnDescriptor};
pub use row::{BinaryRowPayload, NullBitmap};
pub use temporal::{TemporalConfig, TemporalMode, TimeZone, ZeroDate};
