use thiserror::Error;

use crate::lease::{BufferId, CallSite, OperationId};

pub use color_eyre::eyre::eyre;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown field type {field_type} in column {column}")]
    UnknownFieldType { field_type: u8, column: usize },

    #[error("Truncated data: needed {needed} bytes, {available} available")]
    TruncatedData { needed: usize, available: usize },

    #[error("Invalid length-encoded integer marker 0x{0:02X}")]
    InvalidLengthEncodedInteger(u8),

    #[error("Invalid binary row header 0x{0:02X}")]
    InvalidRowHeader(u8),

    #[error("Invalid TIME packet length {0}")]
    InvalidTimePacketLength(u64),

    #[error("Invalid DATE/DATETIME packet length {0}")]
    InvalidDateTimePacketLength(u64),

    #[error("Invalid calendar value: {0}")]
    InvalidCalendarValue(String),

    #[error(
        "Buffer collision on {buffer}: owned by {owner} at {owner_site}, wanted by {requester} at {requester_site}"
    )]
    BufferCollision {
        buffer: BufferId,
        owner: OperationId,
        requester: OperationId,
        owner_site: CallSite,
        requester_site: CallSite,
    },

    #[error("Column {column}: {source}")]
    Column {
        column: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bad config error: {0}")]
    BadConfigError(String),

    #[error("Bad usage error: {0}")]
    BadUsageError(String),

    #[error("Library bug: {0}")]
    LibraryBug(color_eyre::eyre::Report),
}

impl Error {
    /// Strips column context and returns the underlying error.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Column { source, .. } = err {
            err = source;
        }
        err
    }

    /// Column index attached by the row decoder, if any.
    pub fn column(&self) -> Option<usize> {
        match self {
            Error::Column { column, .. } => Some(*column),
            Error::UnknownFieldType { column, .. } => Some(*column),
            _ => None,
        }
    }

    pub(crate) fn in_column(self, column: usize) -> Self {
        Error::Column {
            column,
            source: Box::new(self),
        }
    }

    pub(crate) fn from_debug(err: impl std::fmt::Debug) -> Self {
        Error::LibraryBug(eyre!("{:?}", err))
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;
