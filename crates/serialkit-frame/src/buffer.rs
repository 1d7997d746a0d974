use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

const INITIAL_CAPACITY: usize = 8 * 1024;

/// Append-only, drainable byte accumulator with a hard capacity.
///
/// The substrate every framing strategy scans over. Consuming from the
/// front is amortized O(1) per byte (`BytesMut::advance`/`split_to`), so a
/// streaming scan stays linear instead of going quadratic on repeated
/// front-removal.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    max_size: usize,
}

impl FrameBuffer {
    /// Create a buffer that holds at most `max_size` unframed bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY.min(max_size)),
            max_size,
        }
    }

    /// Append a chunk to the end.
    ///
    /// Fails with [`FrameError::BufferOverflow`] when the resulting logical
    /// length would exceed the cap; the caller must treat that as fatal to
    /// the stream, not as a retryable per-call error.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let resulting = self.buf.len() + chunk.len();
        if resulting > self.max_size {
            return Err(FrameError::BufferOverflow {
                buffered: resulting,
                max: self.max_size,
            });
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Drop the first `n` bytes; the remainder shifts to index 0.
    pub fn consume_prefix(&mut self, n: usize) {
        self.buf.advance(n);
    }

    /// Remove and return the first `n` bytes without copying.
    pub fn take_prefix(&mut self, n: usize) -> Bytes {
        self.buf.split_to(n).freeze()
    }

    /// Read-only view of the current contents.
    pub fn snapshot(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The configured cap.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_snapshot() {
        let mut buffer = FrameBuffer::new(64);
        buffer.append(b"hello").unwrap();
        buffer.append(b" world").unwrap();
        assert_eq!(buffer.snapshot(), b"hello world");
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn append_over_cap_overflows() {
        let mut buffer = FrameBuffer::new(8);
        buffer.append(b"12345678").unwrap();
        let err = buffer.append(b"9").unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferOverflow {
                buffered: 9,
                max: 8
            }
        ));
        // Contents before the failing append are untouched.
        assert_eq!(buffer.snapshot(), b"12345678");
    }

    #[test]
    fn append_exactly_at_cap_succeeds() {
        let mut buffer = FrameBuffer::new(4);
        buffer.append(b"abcd").unwrap();
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn consume_prefix_shifts_remainder() {
        let mut buffer = FrameBuffer::new(64);
        buffer.append(b"abcdef").unwrap();
        buffer.consume_prefix(2);
        assert_eq!(buffer.snapshot(), b"cdef");
    }

    #[test]
    fn take_prefix_returns_front_bytes() {
        let mut buffer = FrameBuffer::new(64);
        buffer.append(b"abcdef").unwrap();
        let front = buffer.take_prefix(3);
        assert_eq!(front.as_ref(), b"abc");
        assert_eq!(buffer.snapshot(), b"def");
    }

    #[test]
    fn consuming_frees_capacity_for_new_appends() {
        let mut buffer = FrameBuffer::new(4);
        buffer.append(b"abcd").unwrap();
        buffer.consume_prefix(4);
        buffer.append(b"efgh").unwrap();
        assert_eq!(buffer.snapshot(), b"efgh");
    }
}
