//! Serial port packet framing and connection sessions.
//!
//! serialkit turns the unbounded, arbitrarily-chunked byte stream of a
//! serial/UART device into discrete application-level packets, and manages
//! the lifecycle of the connection producing that stream.
//!
//! # Crate Structure
//!
//! - [`transport`] — device open/configure (termios), discovery, permissions
//! - [`frame`] — framing strategies over a bounded accumulating buffer
//! - [`session`] — connection sessions: chunk production, packet streams,
//!   writes, teardown

/// Re-export transport types.
pub mod transport {
    pub use serialkit_transport::*;
}

/// Re-export framing types.
pub mod frame {
    pub use serialkit_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use serialkit_session::*;
}
