//! Result-set reading over a single reusable receive buffer.
//!
//! A [`Connection`] owns one receive buffer. Opening a [`ResultSet`] leases
//! that buffer to the result set's operation and mutably borrows the
//! connection, so a second reader or a [`Connection::close`] cannot start until
//! the result set is closed or dropped. Both paths go through the connection's
//! [`BufferTracker`]; a result set that escapes its borrow (e.g. via
//! `mem::forget`) keeps its lease, and a later close is refused with
//! `BufferCollision` instead of tearing down a buffer that is still in use.

use std::collections::VecDeque;
use std::sync::Arc;

use auto_impl::auto_impl;

use crate::buffer_pool::PooledReadBuffer;
use crate::decode::{decode_binary_row, decode_row};
use crate::error::{Error, Result, eyre};
use crate::from_value::FromRow;
use crate::lease::{BufferId, BufferTracker, OperationId};
use crate::log::{Logger, NoopLogger};
use crate::opts::Opts;
use crate::plan::{DecodePlan, build_decode_plan};
use crate::protocol::column::ColumnDescriptor;
use crate::protocol::temporal::TemporalConfig;
use crate::value::Value;

/// Outcome of one [`RowSource::read_row`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    /// A row payload was written into the buffer.
    Row,
    /// No more rows in this result set.
    End,
}

/// How a row payload is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFraming {
    /// Column values back to back.
    #[default]
    Values,
    /// Binary row packet: `0x00` header, NULL bitmap, then the non-NULL values.
    BinaryPacket,
}

/// Supplier of already-defragmented row payloads.
#[auto_impl(&mut, Box)]
pub trait RowSource {
    /// Append the next row payload to `buf` (which is empty on entry), or
    /// report the end of the result set.
    fn read_row(&mut self, buf: &mut Vec<u8>) -> Result<RowEvent>;

    fn framing(&self) -> RowFraming {
        RowFraming::Values
    }
}

/// Rows queued in memory, yielded front to back.
impl RowSource for VecDeque<Vec<u8>> {
    fn read_row(&mut self, buf: &mut Vec<u8>) -> Result<RowEvent> {
        match self.pop_front() {
            Some(row) => {
                buf.extend_from_slice(&row);
                Ok(RowEvent::Row)
            }
            None => Ok(RowEvent::End),
        }
    }
}

/// A row source plus the receive buffer its rows are read into.
pub struct Connection<S> {
    source: S,
    buffer: Option<PooledReadBuffer>,
    tracker: BufferTracker,
    temporal: TemporalConfig,
    next_operation: u64,
}

impl<S: RowSource> Connection<S> {
    pub fn new(source: S, opts: &Opts) -> Self {
        Self::with_logger(source, opts, Arc::new(NoopLogger))
    }

    /// Like [`Connection::new`], reporting buffer collisions to `logger`.
    pub fn with_logger(source: S, opts: &Opts, logger: Arc<dyn Logger>) -> Self {
        Self {
            source,
            buffer: Some(opts.buffer_pool.get_read_buffer()),
            tracker: BufferTracker::with_logger(logger),
            temporal: opts.temporal(),
            next_operation: 1,
        }
    }

    /// Id of the receive buffer, `None` once closed.
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.buffer.as_ref().map(|buffer| buffer.id())
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn tracker(&self) -> &BufferTracker {
        &self.tracker
    }

    pub fn temporal(&self) -> &TemporalConfig {
        &self.temporal
    }

    fn next_operation(&mut self) -> OperationId {
        let operation = OperationId(self.next_operation);
        self.next_operation += 1;
        operation
    }

    fn open_buffer(&self) -> Result<BufferId> {
        self.buffer_id()
            .ok_or_else(|| Error::BadUsageError("connection is closed".to_owned()))
    }

    /// Start reading a result set with the given columns.
    ///
    /// The decode plan is built before the buffer is leased, so an
    /// `UnknownFieldType` leaves the connection untouched.
    #[track_caller]
    #[tracing::instrument(skip_all)]
    pub fn result_set(&mut self, columns: &[ColumnDescriptor]) -> Result<ResultSet<'_, S>> {
        let plan = build_decode_plan(columns, &self.temporal)?;
        let buffer = self.open_buffer()?;
        let operation = self.next_operation();
        self.tracker.acquire(buffer, operation)?;
        tracing::debug!(%buffer, %operation, columns = plan.len(), "result set opened");
        Ok(ResultSet {
            conn: self,
            plan,
            buffer,
            operation,
            finished: false,
        })
    }

    /// Tear down the receive buffer.
    ///
    /// The buffer is leased to a teardown operation first; if a result set
    /// still holds it, both call sites are reported and `BufferCollision` is
    /// returned with the buffer left intact. Closing twice is a no-op.
    #[track_caller]
    pub fn close(&mut self) -> Result<()> {
        let Some(buffer) = self.buffer_id() else {
            return Ok(());
        };
        let operation = self.next_operation();
        self.tracker.acquire(buffer, operation)?;
        self.buffer = None;
        self.tracker.forget(buffer);
        tracing::debug!(%buffer, %operation, "connection closed");
        Ok(())
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("buffer", &self.buffer)
            .field("tracker", &self.tracker)
            .field("temporal", &self.temporal)
            .finish_non_exhaustive()
    }
}

/// Rows of one result set, decoded through a plan built when it was opened.
///
/// Holds the lease on the connection's receive buffer until it is closed,
/// exhausted or dropped.
pub struct ResultSet<'conn, S: RowSource> {
    conn: &'conn mut Connection<S>,
    plan: DecodePlan,
    buffer: BufferId,
    operation: OperationId,
    finished: bool,
}

impl<S: RowSource> ResultSet<'_, S> {
    pub fn plan(&self) -> &DecodePlan {
        &self.plan
    }

    pub fn operation(&self) -> OperationId {
        self.operation
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read the next payload into the receive buffer.
    ///
    /// Returns `false` at the end of the result set. Source errors also end
    /// the result set.
    fn fill_buffer(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        let conn = &mut *self.conn;
        let Some(buffer) = conn.buffer.as_mut() else {
            return Err(Error::LibraryBug(eyre!(
                "{} torn down while leased to {}",
                self.buffer,
                self.operation
            )));
        };
        match conn.source.read_row(buffer.new_read_buffer()) {
            Ok(RowEvent::Row) => Ok(true),
            Ok(RowEvent::End) => {
                self.finish();
                Ok(false)
            }
            Err(err) => {
                self.finish();
                Err(err)
            }
        }
    }

    /// Decode the next row.
    ///
    /// A row that fails to decode is reported as an error and not delivered;
    /// the following call continues with the next row.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.fill_buffer()? {
            return Ok(None);
        }
        let payload = self
            .conn
            .buffer
            .as_ref()
            .map(|buffer| buffer.as_slice())
            .unwrap_or_default();
        let values = match self.conn.source.framing() {
            RowFraming::Values => decode_row(&self.plan, payload)?,
            RowFraming::BinaryPacket => decode_binary_row(&self.plan, payload)?,
        };
        Ok(Some(values))
    }

    /// Decode the next row into `T`.
    pub fn next_as<T: FromRow>(&mut self) -> Result<Option<T>> {
        match self.next_row()? {
            Some(values) => T::from_row(values).map(Some),
            None => Ok(None),
        }
    }

    /// Skip the remaining rows and release the buffer.
    #[tracing::instrument(skip_all)]
    pub fn close(mut self) -> Result<()> {
        let mut skipped = 0usize;
        while self.fill_buffer()? {
            skipped += 1;
        }
        tracing::debug!(operation = %self.operation, skipped, "result set drained");
        Ok(())
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.conn.tracker.release(self.buffer);
            tracing::debug!(
                buffer = %self.buffer,
                operation = %self.operation,
                "result set finished"
            );
        }
    }
}

impl<S: RowSource> Iterator for ResultSet<'_, S> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<S: RowSource> Drop for ResultSet<'_, S> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<S: RowSource> std::fmt::Debug for ResultSet<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("plan", &self.plan)
            .field("buffer", &self.buffer)
            .field("operation", &self.operation)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "conn_test.rs"]
mod conn_test;
