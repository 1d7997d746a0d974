use std::path::PathBuf;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device node.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The device opened but could not be configured (termios).
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Read/write access to the device could not be established.
    ///
    /// Raised before any open is attempted; distinct from [`Open`] so
    /// callers can tell a permissions problem from a missing device.
    ///
    /// [`Open`]: TransportError::Open
    #[error("no read/write permission for {path}")]
    PermissionDenied { path: PathBuf },

    /// The baud rate is not in the POSIX rate table.
    #[error("unsupported baud rate {rate}")]
    InvalidBaudRate { rate: u32 },

    /// An I/O error occurred on the open stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
