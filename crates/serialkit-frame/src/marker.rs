use tracing::trace;

use crate::buffer::FrameBuffer;
use crate::error::{FrameError, Result};
use crate::framer::{find_subsequence, Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};

/// Frames packets enclosed by a start and an end marker sequence.
///
/// Bytes before a start marker are garbage and get discarded to bound
/// memory; the trailing `|start| - 1` bytes are retained while no marker is
/// in sight, so a start marker straddling a chunk boundary is still
/// detected. `include_markers` controls whether emitted packets carry the
/// markers themselves.
pub struct StartEndMarkerFramer {
    buffer: FrameBuffer,
    start: Vec<u8>,
    end: Vec<u8>,
    include_markers: bool,
}

enum Scan {
    /// No start marker anywhere; drop this much garbage.
    NoStart { drop: usize },
    /// Start found but no end yet; drop the garbage before the start.
    NoEnd { drop: usize },
    /// Complete frame: garbage before the start, then the inter-marker
    /// span length.
    Frame { garbage: usize, span: usize },
}

impl StartEndMarkerFramer {
    pub fn new(
        start: impl Into<Vec<u8>>,
        end: impl Into<Vec<u8>>,
        include_markers: bool,
    ) -> Result<Self> {
        Self::with_max_buffer_size(start, end, include_markers, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(
        start: impl Into<Vec<u8>>,
        end: impl Into<Vec<u8>>,
        include_markers: bool,
        max_buffer_size: usize,
    ) -> Result<Self> {
        let start = start.into();
        let end = end.into();
        if start.is_empty() || end.is_empty() {
            return Err(FrameError::invalid_config(
                "start and end markers must not be empty",
            ));
        }
        if start.len() + end.len() > max_buffer_size {
            return Err(FrameError::invalid_config(
                "markers longer than max buffer size can never frame a packet",
            ));
        }
        Ok(Self {
            buffer: FrameBuffer::new(max_buffer_size),
            start,
            end,
            include_markers,
        })
    }

    fn scan(&self) -> Scan {
        let hay = self.buffer.snapshot();
        match find_subsequence(hay, &self.start, 0) {
            None => {
                // Keep a tail that could be the prefix of a split start
                // marker.
                let keep = hay.len().min(self.start.len() - 1);
                Scan::NoStart {
                    drop: hay.len() - keep,
                }
            }
            Some(start_at) => {
                let payload_at = start_at + self.start.len();
                match find_subsequence(hay, &self.end, payload_at) {
                    None => Scan::NoEnd { drop: start_at },
                    Some(end_at) => Scan::Frame {
                        garbage: start_at,
                        span: end_at - payload_at,
                    },
                }
            }
        }
    }
}

impl Framer for StartEndMarkerFramer {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buffer.append(chunk)?;
        let mut packets = Vec::new();

        loop {
            match self.scan() {
                Scan::NoStart { drop } => {
                    if drop > 0 {
                        trace!(dropped = drop, "discarding bytes before start marker");
                        self.buffer.consume_prefix(drop);
                    }
                    return Ok(packets);
                }
                Scan::NoEnd { drop } => {
                    if drop > 0 {
                        trace!(dropped = drop, "discarding bytes before start marker");
                        self.buffer.consume_prefix(drop);
                    }
                    return Ok(packets);
                }
                Scan::Frame { garbage, span } => {
                    if garbage > 0 {
                        trace!(dropped = garbage, "discarding bytes before start marker");
                        self.buffer.consume_prefix(garbage);
                    }
                    if self.include_markers {
                        packets.push(
                            self.buffer
                                .take_prefix(self.start.len() + span + self.end.len()),
                        );
                    } else {
                        self.buffer.consume_prefix(self.start.len());
                        let packet = self.buffer.take_prefix(span);
                        self.buffer.consume_prefix(self.end.len());
                        if !packet.is_empty() {
                            packets.push(packet);
                        }
                    }
                }
            }
        }
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
