/// Errors that can occur while framing a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Malformed framing parameters, rejected at construction time.
    #[error("invalid framing configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Buffered, unframed data exceeded the configured cap.
    ///
    /// Fatal to the framing stream: no frame boundary was found within the
    /// memory bound, so the stream must terminate rather than silently
    /// truncate.
    #[error("frame buffer overflow ({buffered} bytes buffered, max {max})")]
    BufferOverflow { buffered: usize, max: usize },

    /// A header decoded to an implausible frame size. Equally stream-fatal:
    /// waiting for more data can never satisfy it.
    #[error("frame decode error: {reason}")]
    Decode { reason: String },

    /// An I/O error occurred while feeding the framer.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
