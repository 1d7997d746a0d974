//! Serial connection sessions.
//!
//! This is the "just works" layer. [`Session::open`] gates on device
//! permissions, opens and configures the port, and hands back a session
//! that owns the device exclusively: a consumable stream of raw chunks or
//! framed packets, an async `write`, and an idempotent, best-effort
//! `close`.
//!
//! Blocking device I/O never runs on the caller's async context — reads
//! live on a dedicated thread, writes on the Tokio blocking pool.

pub mod error;
pub mod session;
pub mod stream;

pub use error::{Result, SessionError};
pub use session::Session;
pub use stream::{ChunkStream, PacketStream};
