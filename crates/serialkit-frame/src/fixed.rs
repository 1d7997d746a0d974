use crate::buffer::FrameBuffer;
use crate::error::{FrameError, Result};
use crate::framer::{Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};

/// Frames packets of exactly `length` bytes.
///
/// Each drain emits `buffered / length` packets in order; any remainder
/// shorter than `length` stays buffered for the next chunk.
#[derive(Debug)]
pub struct FixedLengthFramer {
    buffer: FrameBuffer,
    length: usize,
}

impl FixedLengthFramer {
    pub fn new(length: usize) -> Result<Self> {
        Self::with_max_buffer_size(length, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(length: usize, max_buffer_size: usize) -> Result<Self> {
        if length == 0 {
            return Err(FrameError::invalid_config("frame length must be positive"));
        }
        if length > max_buffer_size {
            return Err(FrameError::invalid_config(
                "max buffer size smaller than the fixed frame length",
            ));
        }
        Ok(Self {
            buffer: FrameBuffer::new(max_buffer_size),
            length,
        })
    }
}

impl Framer for FixedLengthFramer {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buffer.append(chunk)?;
        let mut packets = Vec::with_capacity(self.buffer.len() / self.length);
        while self.buffer.len() >= self.length {
            packets.push(self.buffer.take_prefix(self.length));
        }
        Ok(packets)
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_whole_frames_keeps_remainder() {
        let mut framer = FixedLengthFramer::new(3).unwrap();

        let packets = framer.push(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), &[0x01, 0x02, 0x03]);

        let packets = framer.push(&[0x04, 0x05, 0x06, 0x07]).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), &[0x04, 0x05, 0x06]);
        assert_eq!(framer.buffered(), 1); // 0x07 retained
    }

    #[test]
    fn many_frames_in_one_chunk() {
        let mut framer = FixedLengthFramer::new(2).unwrap();
        let packets = framer.push(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[1].as_ref(), &[3, 4]);
        assert_eq!(framer.buffered(), 1);
    }

    #[test]
    fn frame_assembled_byte_by_byte() {
        let mut framer = FixedLengthFramer::new(3).unwrap();
        assert!(framer.push(&[1]).unwrap().is_empty());
        assert!(framer.push(&[2]).unwrap().is_empty());
        let packets = framer.push(&[3]).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn zero_length_rejected() {
        let err = FixedLengthFramer::new(0).unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfig { .. }));
    }

    #[test]
    fn length_over_cap_rejected() {
        let err = FixedLengthFramer::with_max_buffer_size(16, 8).unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfig { .. }));
    }
}
