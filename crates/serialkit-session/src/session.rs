use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, TryLockError};

use bytes::Bytes;
use serialkit_frame::Framer;
use serialkit_transport::{permissions, SerialConfig, SerialPort, SerialStream, TransportError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::stream::{ChunkStream, PacketStream};

/// Upper bound on a single raw chunk read from the device.
const READ_CHUNK_SIZE: usize = 1024;
const CHUNK_CHANNEL_CAPACITY: usize = 32;
const PACKET_CHANNEL_CAPACITY: usize = 32;

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock still yields a usable Option slot.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One open serial connection: the exclusive owner of the device handle,
/// its chunk production, and its teardown.
///
/// Read and write paths hold independent duplicated descriptors, so a
/// pending write never stalls incoming reads and vice versa. Blocking
/// device I/O is confined to a dedicated reader thread and to
/// `spawn_blocking` for writes; callers stay on their own async context.
///
/// `close` is terminal and idempotent; reads and writes issued afterwards
/// fail with [`SessionError::Closed`].
pub struct Session {
    read_half: StdMutex<Option<Box<dyn Read + Send>>>,
    write_half: Arc<StdMutex<Option<Box<dyn Write + Send>>>>,
    transport: StdMutex<Option<SerialStream>>,
    cancel: CancellationToken,
    closed: AtomicBool,
    bytes_read: Arc<AtomicU64>,
    bytes_written: Arc<AtomicU64>,
}

impl Session {
    /// Open and configure the device at `path`, after establishing
    /// read/write permission.
    ///
    /// Fails with [`TransportError::PermissionDenied`] before any device
    /// I/O when permission cannot be established; open and configure
    /// failures are reported distinctly.
    pub fn open(path: impl AsRef<Path>, config: SerialConfig) -> Result<Self> {
        let path = path.as_ref();
        if !permissions::ensure_access(path) {
            return Err(TransportError::PermissionDenied {
                path: path.to_path_buf(),
            }
            .into());
        }

        let stream = SerialPort::new(path, config).open()?;
        let reader = stream.try_clone()?;
        let writer = stream.try_clone()?;

        Ok(Self::assemble(
            Box::new(reader),
            Box::new(writer),
            Some(stream),
        ))
    }

    /// Assemble a session from already-opened read and write halves.
    ///
    /// The halves are used as-is; there is no underlying device handle to
    /// release on close. This is the seam for driving a session over
    /// something other than a serial device (sockets, pipes, test fakes).
    pub fn from_parts(reader: Box<dyn Read + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self::assemble(reader, writer, None)
    }

    fn assemble(
        reader: Box<dyn Read + Send>,
        writer: Box<dyn Write + Send>,
        transport: Option<SerialStream>,
    ) -> Self {
        Self {
            read_half: StdMutex::new(Some(reader)),
            write_half: Arc::new(StdMutex::new(Some(writer))),
            transport: StdMutex::new(transport),
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
            bytes_read: Arc::new(AtomicU64::new(0)),
            bytes_written: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start chunk production and hand out its consumable stream.
    ///
    /// Production runs on a dedicated reader thread doing blocking reads of
    /// 1 to [`READ_CHUNK_SIZE`] bytes. It is at-most-once per session: a
    /// second call fails with [`SessionError::StreamTaken`], and a finished
    /// stream is only restarted by opening a new session.
    pub fn chunks(&self) -> Result<ChunkStream> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        let reader = lock(&self.read_half)
            .take()
            .ok_or(SessionError::StreamTaken)?;

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let cancel = self.cancel.clone();
        let bytes_read = Arc::clone(&self.bytes_read);

        std::thread::Builder::new()
            .name("serialkit-read".into())
            .spawn(move || chunk_pump(reader, tx, cancel, bytes_read))
            .map_err(|err| SessionError::Transport(TransportError::Io(err)))?;

        Ok(ChunkStream { rx })
    }

    /// Chunk production composed with a framing strategy: a lazy,
    /// unbounded, non-restartable stream of packets.
    ///
    /// A framing error (overflow, implausible header) is yielded exactly
    /// once and ends the stream. Must be called within a Tokio runtime.
    pub fn packets(&self, framer: impl Framer + 'static) -> Result<PacketStream> {
        let mut chunks = self.chunks()?;
        let (tx, rx) = mpsc::channel(PACKET_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut framer = framer;
            while let Some(item) = chunks.recv().await {
                match item {
                    Ok(chunk) => match framer.push(&chunk) {
                        Ok(packets) => {
                            for packet in packets {
                                if tx.send(Ok(packet)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(err) => {
                            let _ = tx.send(Err(err.into())).await;
                            return;
                        }
                    },
                    Err(err) => {
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                }
            }
        });

        Ok(PacketStream { rx })
    }

    /// Submit bytes for transmission.
    ///
    /// The blocking write runs on the Tokio blocking pool and fully
    /// flushes before returning, so a successful return means the bytes
    /// reached the OS buffer. Writes are serialized — one in flight at a
    /// time. There is no write timeout; a stalled device stalls the call.
    pub async fn write(&self, data: impl Into<Bytes>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        let data: Bytes = data.into();
        let len = data.len() as u64;
        let write_half = Arc::clone(&self.write_half);

        let result = tokio::task::spawn_blocking(move || {
            let mut guard = lock(&write_half);
            let writer = guard.as_mut().ok_or(SessionError::Closed)?;
            writer
                .write_all(&data)
                .and_then(|()| writer.flush())
                .map_err(|err| SessionError::Transport(TransportError::Io(err)))
        })
        .await;

        match result {
            Ok(Ok(())) => {
                self.bytes_written.fetch_add(len, Ordering::Relaxed);
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(SessionError::Transport(TransportError::Io(
                std::io::Error::other(format!("blocking write task failed: {join_err}")),
            ))),
        }
    }

    /// Tear the session down: cancel chunk production, then release the
    /// input path, the output path and the device handle independently.
    ///
    /// Idempotent — a second call is a no-op. Every release failure is
    /// logged and never aborts the remaining releases.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("session already closed");
            return;
        }
        self.cancel.cancel();

        // Input path: either still parked here, or owned by the reader
        // thread, which exits on cancellation and drops it.
        if lock(&self.read_half).take().is_some() {
            debug!("released read half");
        }

        // Output path: never block teardown on an in-flight write.
        match self.write_half.try_lock() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    debug!("released write half");
                }
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().take();
            }
            Err(TryLockError::WouldBlock) => {
                warn!("write in flight during close; write half released when it completes");
            }
        }

        // Device handle last, reporting the close error a plain drop would
        // swallow.
        if let Some(stream) = lock(&self.transport).take() {
            if let Err(err) = stream.close() {
                warn!(%err, "failed to close serial transport");
            }
        }

        info!("session closed");
    }

    /// Whether `close` has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Total bytes produced by chunk production so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Total bytes successfully written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Blocking read loop on the dedicated reader thread.
///
/// Ends on end-of-stream, on a transport error (surfaced once), when the
/// consumer goes away, or on cancellation — which is reported as graceful
/// completion, never as an error.
fn chunk_pump(
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::Sender<std::result::Result<Bytes, SessionError>>,
    cancel: CancellationToken,
    bytes_read: Arc<AtomicU64>,
) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        if cancel.is_cancelled() {
            debug!("chunk production cancelled");
            return;
        }
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("end of stream");
                return;
            }
            Ok(n) => {
                // Cancellation may have landed while the read was blocked;
                // emit nothing after it.
                if cancel.is_cancelled() {
                    debug!("chunk production cancelled");
                    return;
                }
                bytes_read.fetch_add(n as u64, Ordering::Relaxed);
                if tx
                    .blocking_send(Ok(Bytes::copy_from_slice(&buf[..n])))
                    .is_err()
                {
                    debug!("chunk consumer dropped");
                    return;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                if !cancel.is_cancelled() {
                    let _ = tx.blocking_send(Err(TransportError::Io(err).into()));
                }
                return;
            }
        }
    }
}
