use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use crossbeam_queue::ArrayQueue;

use crate::buffer::ReadBuffer;
use crate::lease::BufferId;

const POOL_CAPACITY: usize = 128;

pub static GLOBAL_BUFFER_POOL: LazyLock<Arc<BufferPool>> =
    LazyLock::new(|| Arc::new(BufferPool::default()));

/// Process-wide so that ids from different pools never collide.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

fn next_buffer_id() -> BufferId {
    BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
}

/// A pooled `ReadBuffer` that returns its allocation to the pool on drop.
pub struct PooledReadBuffer {
    pool: Arc<BufferPool>,
    inner: ManuallyDrop<ReadBuffer>,
}

impl PooledReadBuffer {
    fn new(pool: Arc<BufferPool>, buffer: ReadBuffer) -> Self {
        Self {
            pool,
            inner: ManuallyDrop::new(buffer),
        }
    }
}

impl Deref for PooledReadBuffer {
    type Target = ReadBuffer;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledReadBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Drop for PooledReadBuffer {
    fn drop(&mut self) {
        // SAFETY: inner is never accessed after this
        let buffer = unsafe { ManuallyDrop::take(&mut self.inner) };
        self.pool.return_read_buffer(buffer);
    }
}

impl std::fmt::Debug for PooledReadBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PooledReadBuffer").field(&*self.inner).finish()
    }
}

#[derive(Debug)]
pub struct BufferPool {
    read_buffers: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            read_buffers: ArrayQueue::new(capacity),
        }
    }

    /// Take a buffer from the pool (or allocate one) under a fresh `BufferId`.
    pub fn get_read_buffer(self: &Arc<Self>) -> PooledReadBuffer {
        let bytes = self.read_buffers.pop().unwrap_or_default();
        let buffer = ReadBuffer::with_bytes(next_buffer_id(), bytes);
        PooledReadBuffer::new(Arc::clone(self), buffer)
    }

    pub fn return_read_buffer(&self, buffer: ReadBuffer) {
        let mut bytes = buffer.into_bytes();
        // Clear buffers but preserve capacity
        bytes.clear();
        // Ignore if pool is full
        let _ = self.read_buffers.push(bytes);
    }

    /// Number of idle buffers.
    pub fn len(&self) -> usize {
        self.read_buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_buffers.is_empty()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(POOL_CAPACITY)
    }
}
