use std::sync::Arc;

use crate::buffer_pool::BufferPool;

#[test]
fn test_buffer_returns_to_pool_on_drop() {
    let pool = Arc::new(BufferPool::new(4));
    assert!(pool.is_empty());
    {
        let mut buffer = pool.get_read_buffer();
        buffer.new_read_buffer().extend_from_slice(b"row payload");
    }
    assert_eq!(pool.len(), 1);
}

#[test]
fn test_reused_buffer_is_cleared_and_keeps_capacity() {
    let pool = Arc::new(BufferPool::new(4));
    {
        let mut buffer = pool.get_read_buffer();
        buffer.new_read_buffer().extend_from_slice(&[0u8; 1024]);
    }
    let mut buffer = pool.get_read_buffer();
    assert!(buffer.as_slice().is_empty());
    assert!(buffer.new_read_buffer().capacity() >= 1024);
    assert!(pool.is_empty());
}

#[test]
fn test_every_checkout_gets_a_fresh_id() {
    let pool = Arc::new(BufferPool::new(4));
    let first = pool.get_read_buffer().id();
    let second = pool.get_read_buffer().id();
    let third = {
        let a = pool.get_read_buffer();
        let b = pool.get_read_buffer();
        assert_ne!(a.id(), b.id());
        a.id()
    };
    assert_ne!(first, second);
    assert_ne!(second, third);
}

#[test]
fn test_full_pool_drops_extra_buffers() {
    let pool = Arc::new(BufferPool::new(1));
    let a = pool.get_read_buffer();
    let b = pool.get_read_buffer();
    drop(a);
    drop(b);
    assert_eq!(pool.len(), 1);
}
