use crate::buffer::FrameBuffer;
use crate::error::{FrameError, Result};
use crate::framer::{find_subsequence, Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};

/// Frames packets separated by a fixed delimiter byte sequence.
///
/// The classic "sticky packet" splitter: scan the accumulated buffer for
/// the delimiter, emit everything before it, drop the delimiter, rescan.
/// Adjacent delimiters produce no empty packet. A delimiter split across
/// two chunks is still found, because scanning always covers the full
/// accumulated buffer.
#[derive(Debug)]
pub struct DelimiterFramer {
    buffer: FrameBuffer,
    delimiter: Vec<u8>,
    /// No delimiter occurrence starts before this offset; the scan resumes
    /// here instead of rescanning the whole buffer on every chunk.
    scan_from: usize,
}

impl DelimiterFramer {
    pub fn new(delimiter: impl Into<Vec<u8>>) -> Result<Self> {
        Self::with_max_buffer_size(delimiter, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(
        delimiter: impl Into<Vec<u8>>,
        max_buffer_size: usize,
    ) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(FrameError::invalid_config("delimiter must not be empty"));
        }
        if delimiter.len() > max_buffer_size {
            return Err(FrameError::invalid_config(
                "delimiter longer than max buffer size can never match",
            ));
        }
        Ok(Self {
            buffer: FrameBuffer::new(max_buffer_size),
            delimiter,
            scan_from: 0,
        })
    }
}

impl Framer for DelimiterFramer {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buffer.append(chunk)?;
        let mut packets = Vec::new();

        loop {
            match find_subsequence(self.buffer.snapshot(), &self.delimiter, self.scan_from) {
                Some(at) => {
                    if at > 0 {
                        packets.push(self.buffer.take_prefix(at));
                    }
                    self.buffer.consume_prefix(self.delimiter.len());
                    self.scan_from = 0;
                }
                None => {
                    // Everything up to a possible delimiter prefix at the
                    // tail is known delimiter-free.
                    self.scan_from = self
                        .buffer
                        .len()
                        .saturating_sub(self.delimiter.len() - 1);
                    return Ok(packets);
                }
            }
        }
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(framer: &mut DelimiterFramer, chunks: &[&[u8]]) -> Vec<Packet> {
        let mut packets = Vec::new();
        for chunk in chunks {
            packets.extend(framer.push(chunk).unwrap());
        }
        packets
    }

    #[test]
    fn splits_on_single_byte_delimiter() {
        let mut framer = DelimiterFramer::new([0x0A]).unwrap();
        let packets = push_all(
            &mut framer,
            &[&[0x01, 0x02, 0x03, 0x0A, 0x04, 0x05, 0x06, 0x0A, 0x07]],
        );

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(packets[1].as_ref(), &[0x04, 0x05, 0x06]);
        assert_eq!(framer.buffered(), 1); // 0x07 retained unframed
    }

    #[test]
    fn packet_completed_across_chunks() {
        let mut framer = DelimiterFramer::new([0x0A]).unwrap();
        assert!(framer.push(&[0x01, 0x02]).unwrap().is_empty());
        let packets = framer.push(&[0x03, 0x0A]).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn multiple_packets_in_one_chunk() {
        let mut framer = DelimiterFramer::new([0x0A]).unwrap();
        let packets = framer.push(&[0x01, 0x0A, 0x02, 0x0A, 0x03, 0x0A]).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[2].as_ref(), &[0x03]);
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn adjacent_delimiters_emit_nothing() {
        let mut framer = DelimiterFramer::new([0x0A]).unwrap();
        let packets = framer.push(&[0x0A, 0x0A, 0x01, 0x0A]).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), &[0x01]);
    }

    #[test]
    fn multi_byte_delimiter_split_across_chunks() {
        let mut framer = DelimiterFramer::new(*b"\r\n").unwrap();
        assert!(framer.push(b"hello\r").unwrap().is_empty());
        let packets = framer.push(b"\nworld").unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref(), b"hello");
        assert_eq!(framer.buffered(), 5);
    }

    #[test]
    fn empty_delimiter_rejected() {
        let err = DelimiterFramer::new([]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfig { .. }));
    }

    #[test]
    fn overflow_without_delimiter() {
        let mut framer = DelimiterFramer::with_max_buffer_size([0x0A], 8).unwrap();
        framer.push(&[0; 8]).unwrap();
        let err = framer.push(&[0]).unwrap_err();
        assert!(matches!(err, FrameError::BufferOverflow { .. }));
    }

    #[test]
    fn scan_does_not_miss_delimiter_after_resume() {
        // Feed a long delimiter-free run, then the delimiter; the resumed
        // scan must still find it at the right boundary.
        let mut framer = DelimiterFramer::new(*b"--").unwrap();
        assert!(framer.push(&[b'x'; 100]).unwrap().is_empty());
        assert!(framer.push(b"-").unwrap().is_empty());
        let packets = framer.push(b"-").unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].len(), 100);
    }
}
