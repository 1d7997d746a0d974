use crate::buffer::FrameBuffer;
use crate::error::Result;
use crate::framer::{Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};

/// A packet extracted by a [`PacketParser`], plus how many buffered bytes
/// it consumed (packet bytes and any surrounding framing overhead).
pub struct ParsedPacket {
    pub packet: Packet,
    pub consumed: usize,
}

/// Pluggable packet detection for protocols the built-in strategies don't
/// cover.
///
/// Implementations must be deterministic and make forward progress:
/// whenever a packet is returned, `consumed` must be at least 1 so the
/// buffer shrinks. Returning `None` means "no complete packet yet — wait
/// for more data".
pub trait PacketParser: Send {
    fn try_extract(&mut self, buf: &[u8]) -> Option<ParsedPacket>;
}

impl<F> PacketParser for F
where
    F: FnMut(&[u8]) -> Option<ParsedPacket> + Send,
{
    fn try_extract(&mut self, buf: &[u8]) -> Option<ParsedPacket> {
        self(buf)
    }
}

/// Frames packets by delegating boundary detection to a [`PacketParser`].
///
/// The parser is invoked repeatedly on the accumulated buffer until it
/// reports no complete packet, at which point the framer waits for more
/// data.
pub struct CustomFramer<P> {
    buffer: FrameBuffer,
    parser: P,
}

impl<P: PacketParser> CustomFramer<P> {
    pub fn new(parser: P) -> Self {
        Self::with_max_buffer_size(parser, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(parser: P, max_buffer_size: usize) -> Self {
        Self {
            buffer: FrameBuffer::new(max_buffer_size),
            parser,
        }
    }
}

impl<P: PacketParser> Framer for CustomFramer<P> {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buffer.append(chunk)?;
        let mut packets = Vec::new();

        while let Some(parsed) = self.parser.try_extract(self.buffer.snapshot()) {
            // Forward-progress contract: a parser that returns a packet
            // without consuming anything would loop forever.
            assert!(
                parsed.consumed > 0,
                "packet parser returned a packet without consuming any bytes"
            );
            assert!(
                parsed.consumed <= self.buffer.len(),
                "packet parser consumed more bytes than were buffered"
            );
            self.buffer.consume_prefix(parsed.consumed);
            packets.push(parsed.packet);
        }
        Ok(packets)
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
