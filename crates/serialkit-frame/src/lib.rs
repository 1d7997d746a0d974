//! Packet framing for unbounded, arbitrarily-chunked byte streams.
//!
//! A serial device hands back bytes in whatever chunks the driver felt
//! like; this crate reassembles them into discrete packets. Five strategies
//! are provided, all operating over a bounded [`FrameBuffer`]:
//!
//! - [`DelimiterFramer`] — packets separated by a fixed byte sequence
//! - [`FixedLengthFramer`] — packets of exactly N bytes
//! - [`StartEndMarkerFramer`] — packets framed by start/end sequences
//! - [`LengthPrefixedFramer`] — a header carries the frame length
//! - [`CustomFramer`] — pluggable [`PacketParser`] escape hatch
//!
//! Every strategy drains all complete packets per fed chunk and enforces
//! the same buffer cap, so unframed garbage cannot grow memory without
//! bound.

pub mod buffer;
pub mod custom;
pub mod delimiter;
pub mod error;
pub mod fixed;
pub mod framer;
pub mod length_prefixed;
pub mod marker;

pub use buffer::FrameBuffer;
pub use custom::{CustomFramer, PacketParser, ParsedPacket};
pub use delimiter::DelimiterFramer;
pub use error::{FrameError, Result};
pub use fixed::FixedLengthFramer;
pub use framer::{Framer, Packet, DEFAULT_MAX_BUFFER_SIZE};
pub use length_prefixed::{Endianness, LengthPrefixedConfig, LengthPrefixedFramer};
pub use marker::StartEndMarkerFramer;
