use crate::lease::BufferId;

/// Receive buffer reused across row reads.
///
/// `Connection` holds one `ReadBuffer` and reads every row payload into it.
/// Bytes are valid until the next read.
#[derive(Debug)]
pub struct ReadBuffer {
    id: BufferId,
    bytes: Vec<u8>,
}

impl ReadBuffer {
    /// Create an empty buffer
    pub fn new(id: BufferId) -> Self {
        Self::with_bytes(id, Vec::new())
    }

    /// Wrap an existing allocation; its contents are discarded.
    pub fn with_bytes(id: BufferId, mut bytes: Vec<u8>) -> Self {
        bytes.clear();
        Self { id, bytes }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Clear the buffer and return mutable access for the next read.
    #[inline]
    pub fn new_read_buffer(&mut self) -> &mut Vec<u8> {
        self.bytes.clear();
        &mut self.bytes
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Give the allocation back, e.g. to a pool.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buffer = ReadBuffer::new(BufferId(3));
        assert_eq!(buffer.id(), BufferId(3));
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn with_bytes_discards_contents() {
        let buffer = ReadBuffer::with_bytes(BufferId(1), b"stale".to_vec());
        assert!(buffer.as_slice().is_empty());
        assert!(buffer.into_bytes().capacity() >= 5);
    }

    #[test]
    fn reuse_preserves_capacity() {
        let mut buffer = ReadBuffer::new(BufferId(1));
        buffer.new_read_buffer().extend_from_slice(b"first row");
        assert_eq!(buffer.as_slice(), b"first row");

        let bytes = buffer.new_read_buffer();
        assert!(bytes.is_empty());
        assert!(bytes.capacity() >= 9);
    }
}
