use bytes::Bytes;

use crate::error::Result;

/// One complete, delimited unit of application data extracted from the raw
/// stream. Ownership transfers to the consumer on yield; the framing engine
/// keeps no reference after emission.
pub type Packet = Bytes;

/// Default cap on buffered, unframed bytes: 1 MiB.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// A packet-boundary algorithm over an accumulating byte stream.
///
/// Implementations buffer partial data internally. `push` must drain every
/// packet completed by the fed chunk before returning — a single chunk may
/// carry many packets, or none.
pub trait Framer: Send {
    /// Feed a newly arrived chunk; returns the packets it completed, in
    /// stream order.
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>>;

    /// Bytes currently buffered without a completed frame.
    fn buffered(&self) -> usize;
}

/// First occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_occurrence() {
        assert_eq!(find_subsequence(b"abcabc", b"bc", 0), Some(1));
        assert_eq!(find_subsequence(b"abcabc", b"bc", 2), Some(4));
    }

    #[test]
    fn missing_needle() {
        assert_eq!(find_subsequence(b"abc", b"xy", 0), None);
        assert_eq!(find_subsequence(b"ab", b"abc", 0), None);
    }

    #[test]
    fn from_past_end() {
        assert_eq!(find_subsequence(b"ab", b"ab", 1), None);
    }
}
