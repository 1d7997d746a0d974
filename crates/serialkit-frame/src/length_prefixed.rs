use crate::buffer::FrameBuffer;
use crate::error::{FrameError, Result};
use crate::framer::{Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};

/// Byte order of the length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// Layout of a length-prefixed frame header.
///
/// The header is `header_size` bytes; somewhere inside it an unsigned
/// integer of `length_field_size` bytes (1, 2 or 4) at
/// `length_field_offset` declares either the payload length or the total
/// frame length (`length_includes_header`).
#[derive(Debug, Clone, Copy)]
pub struct LengthPrefixedConfig {
    pub header_size: usize,
    pub length_field_offset: usize,
    pub length_field_size: usize,
    pub endianness: Endianness,
    pub length_includes_header: bool,
}

/// Frames packets whose size is declared in a fixed-layout header.
///
/// Emitted packets are whole frames (header and payload). A header that
/// declares an impossible frame size fails the stream with
/// [`FrameError::Decode`] — waiting for more bytes could never satisfy it.
#[derive(Debug)]
pub struct LengthPrefixedFramer {
    buffer: FrameBuffer,
    config: LengthPrefixedConfig,
}

impl LengthPrefixedFramer {
    pub fn new(config: LengthPrefixedConfig) -> Result<Self> {
        Self::with_max_buffer_size(config, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(
        config: LengthPrefixedConfig,
        max_buffer_size: usize,
    ) -> Result<Self> {
        if config.header_size == 0 {
            return Err(FrameError::invalid_config("header size must be positive"));
        }
        if !matches!(config.length_field_size, 1 | 2 | 4) {
            return Err(FrameError::invalid_config(
                "length field size must be 1, 2 or 4 bytes",
            ));
        }
        if config.length_field_offset + config.length_field_size > config.header_size {
            return Err(FrameError::invalid_config(
                "length field does not fit inside the header",
            ));
        }
        if config.header_size > max_buffer_size {
            return Err(FrameError::invalid_config(
                "max buffer size smaller than the frame header",
            ));
        }
        Ok(Self {
            buffer: FrameBuffer::new(max_buffer_size),
            config,
        })
    }

    /// Total frame size declared by the buffered header, or a decode error
    /// when the declaration can never be satisfied.
    fn decode_total_size(&self) -> Result<usize> {
        let header = &self.buffer.snapshot()[..self.config.header_size];
        let field =
            &header[self.config.length_field_offset..][..self.config.length_field_size];

        let raw: u64 = match (self.config.length_field_size, self.config.endianness) {
            (1, _) => u64::from(field[0]),
            (2, Endianness::Big) => u64::from(u16::from_be_bytes([field[0], field[1]])),
            (2, Endianness::Little) => u64::from(u16::from_le_bytes([field[0], field[1]])),
            (4, Endianness::Big) => u64::from(u32::from_be_bytes([
                field[0], field[1], field[2], field[3],
            ])),
            (4, Endianness::Little) => u64::from(u32::from_le_bytes([
                field[0], field[1], field[2], field[3],
            ])),
            // Field width was validated at construction.
            _ => unreachable!("length field size validated at construction"),
        };

        let header_size = self.config.header_size as u64;
        let total = if self.config.length_includes_header {
            if raw < header_size {
                return Err(FrameError::Decode {
                    reason: format!(
                        "declared total frame size {raw} smaller than the {header_size}-byte header"
                    ),
                });
            }
            raw
        } else {
            header_size + raw
        };

        let max = self.buffer.max_size() as u64;
        if total == 0 || total > max {
            return Err(FrameError::Decode {
                reason: format!("declared frame size {total} outside (0, {max}]"),
            });
        }
        Ok(total as usize)
    }
}

impl Framer for LengthPrefixedFramer {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buffer.append(chunk)?;
        let mut packets = Vec::new();

        while self.buffer.len() >= self.config.header_size {
            let total = self.decode_total_size()?;
            if self.buffer.len() < total {
                break;
            }
            packets.push(self.buffer.take_prefix(total));
        }
        Ok(packets)
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
