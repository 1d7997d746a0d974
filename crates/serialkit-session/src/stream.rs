use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use serialkit_frame::Packet;
use tokio::sync::mpsc;

use crate::error::SessionError;

/// Consumable stream of raw byte chunks read from the device.
///
/// This is the explicit at-most-once handle for chunk production: it is
/// handed out once per session ([`Session::chunks`]) and cannot be
/// re-iterated — when it ends, only a new session restarts production.
/// Cancellation ends the stream without an error item.
///
/// [`Session::chunks`]: crate::session::Session::chunks
#[derive(Debug)]
pub struct ChunkStream {
    pub(crate) rx: mpsc::Receiver<Result<Bytes, SessionError>>,
}

impl ChunkStream {
    /// Next raw chunk, `None` once production has ended.
    pub async fn recv(&mut self) -> Option<Result<Bytes, SessionError>> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for ChunkStream {
    type Item = Result<Bytes, SessionError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Consumable stream of framed packets.
///
/// Lazy, unbounded and non-restartable, like the chunk stream it is built
/// on. A framing error (overflow, decode) is yielded exactly once and ends
/// the stream.
#[derive(Debug)]
pub struct PacketStream {
    pub(crate) rx: mpsc::Receiver<Result<Packet, SessionError>>,
}

impl PacketStream {
    /// Next packet, `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Packet, SessionError>> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for PacketStream {
    type Item = Result<Packet, SessionError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
