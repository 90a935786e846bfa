//! Receive-buffer ownership tracking.
//!
//! A receive buffer is reused across many logical reads. At any time at most one
//! read operation may hold a lease on it. Within a `Connection` this is enforced
//! by the borrow checker: a `ResultSet` mutably borrows its connection, so a
//! second reader or a teardown cannot start while it is alive. `BufferTracker`
//! records the lease at runtime so that anything that escapes that structure
//! (a leaked result set, an id-addressed buffer shared across call sites) is
//! reported instead of silently interleaving reads.
//!
//! Every lease remembers the call site of its acquirer. With the `buffer-trace`
//! feature a full backtrace is captured as well.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::log::{Logger, NoopLogger};

/// Identity of a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Identity of a logical read (or teardown) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Where a lease was requested.
#[derive(Debug, Clone)]
pub struct CallSite {
    location: &'static Location<'static>,
    #[cfg(feature = "buffer-trace")]
    backtrace: Arc<std::backtrace::Backtrace>,
}

impl CallSite {
    #[track_caller]
    pub fn capture() -> Self {
        Self {
            location: Location::caller(),
            #[cfg(feature = "buffer-trace")]
            backtrace: Arc::new(std::backtrace::Backtrace::force_capture()),
        }
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.location.file(), self.location.line())?;
        #[cfg(feature = "buffer-trace")]
        write!(f, "\n{}", self.backtrace)?;
        Ok(())
    }
}

/// Lease state of a single buffer.
#[derive(Debug, Clone, Default)]
pub enum Lease {
    #[default]
    Free,
    Leased { owner: OperationId, site: CallSite },
}

impl Lease {
    pub fn is_free(&self) -> bool {
        matches!(self, Lease::Free)
    }

    pub fn owner(&self) -> Option<OperationId> {
        match self {
            Lease::Free => None,
            Lease::Leased { owner, .. } => Some(*owner),
        }
    }
}

/// Runtime record of which operation owns which buffer.
pub struct BufferTracker {
    leases: HashMap<BufferId, Lease>,
    logger: Arc<dyn Logger>,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoopLogger))
    }

    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            leases: HashMap::new(),
            logger,
        }
    }

    /// Transition `buffer` from `Free` to `Leased(operation)`.
    ///
    /// If the buffer is already leased the existing lease is left untouched,
    /// both call sites are reported to the logger and `BufferCollision` is
    /// returned.
    #[track_caller]
    pub fn acquire(&mut self, buffer: BufferId, operation: OperationId) -> Result<()> {
        let site = CallSite::capture();
        let lease = self.leases.entry(buffer).or_default();
        if let Lease::Leased {
            owner,
            site: owner_site,
        } = &*lease
        {
            let err = Error::BufferCollision {
                buffer,
                owner: *owner,
                requester: operation,
                owner_site: owner_site.clone(),
                requester_site: site,
            };
            self.logger.error(&err);
            return Err(err);
        }
        tracing::trace!(%buffer, %operation, "buffer leased");
        *lease = Lease::Leased {
            owner: operation,
            site,
        };
        Ok(())
    }

    /// Transition `buffer` back to `Free`, whoever held it.
    ///
    /// Releasing a free (or unknown) buffer is a no-op.
    pub fn release(&mut self, buffer: BufferId) {
        if let Some(lease) = self.leases.get_mut(&buffer)
            && let Some(owner) = lease.owner()
        {
            tracing::trace!(%buffer, %owner, "buffer released");
            *lease = Lease::Free;
        }
    }

    pub fn lease(&self, buffer: BufferId) -> &Lease {
        static FREE: Lease = Lease::Free;
        self.leases.get(&buffer).unwrap_or(&FREE)
    }

    /// Drop all bookkeeping for `buffer`, e.g. once it has been torn down.
    pub fn forget(&mut self, buffer: BufferId) {
        self.leases.remove(&buffer);
    }
}

impl Default for BufferTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferTracker")
            .field("leases", &self.leases)
            .finish_non_exhaustive()
    }
}
