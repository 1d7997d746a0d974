/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (open, configure, permission, device I/O).
    #[error("transport error: {0}")]
    Transport(#[from] serialkit_transport::TransportError),

    /// Framing-level error (invalid config, overflow, decode).
    #[error("frame error: {0}")]
    Frame(#[from] serialkit_frame::FrameError),

    /// The session was closed; reads and writes fail deterministically
    /// instead of silently doing nothing.
    #[error("session is closed")]
    Closed,

    /// The chunk stream was already taken. Chunk production is
    /// at-most-once per session; open a new session to restart it.
    #[error("chunk stream already taken for this session")]
    StreamTaken,
}

pub type Result<T> = std::result::Result<T, SessionError>;
