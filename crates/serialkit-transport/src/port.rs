use std::ffi::CString;
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{DataBits, Parity, SerialConfig, StopBits};
use crate::error::{Result, TransportError};

/// A serial device path plus the line parameters to apply on open.
///
/// [`SerialPort::open`] performs the two-step native sequence: open the
/// device node, then configure the line via termios. The two failures are
/// reported distinctly ([`TransportError::Open`] vs
/// [`TransportError::Configure`]); a configure failure closes the
/// descriptor before returning.
pub struct SerialPort {
    path: PathBuf,
    config: SerialConfig,
}

impl SerialPort {
    pub fn new(path: impl AsRef<Path>, config: SerialConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    /// The device path this port refers to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured line parameters.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Open and configure the device, returning the raw byte stream.
    pub fn open(&self) -> Result<SerialStream> {
        let c_path =
            CString::new(self.path.as_os_str().as_bytes()).map_err(|_| TransportError::Open {
                path: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "device path contains interior NUL",
                ),
            })?;

        // O_NONBLOCK only so the open itself cannot hang on a line with no
        // carrier; cleared again below so reads stay blocking.
        // SAFETY: `c_path` is a valid NUL-terminated string for the duration
        // of the call.
        let fd = unsafe {
            libc::open(
                c_path.as_ptr(),
                libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK,
            )
        };
        if fd == -1 {
            return Err(TransportError::Open {
                path: self.path.clone(),
                source: std::io::Error::last_os_error(),
            });
        }
        // SAFETY: `fd` was just returned by a successful open(2) and is not
        // owned by anything else.
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };

        // SAFETY: `owned` holds an open descriptor.
        unsafe {
            let flags = libc::fcntl(owned.as_raw_fd(), libc::F_GETFL);
            if flags != -1 {
                libc::fcntl(owned.as_raw_fd(), libc::F_SETFL, flags & !libc::O_NONBLOCK);
            }
        }

        if let Err(source) = configure_termios(owned.as_raw_fd(), &self.config) {
            // `owned` drops here, closing the descriptor.
            return Err(TransportError::Configure {
                path: self.path.clone(),
                source,
            });
        }

        info!(path = ?self.path, baud = self.config.baud_rate, "opened serial port");
        Ok(SerialStream {
            file: File::from(owned),
        })
    }
}

fn baud_to_speed(rate: u32) -> Option<libc::speed_t> {
    let speed = match rate {
        0 => libc::B0,
        50 => libc::B50,
        75 => libc::B75,
        110 => libc::B110,
        134 => libc::B134,
        150 => libc::B150,
        200 => libc::B200,
        300 => libc::B300,
        600 => libc::B600,
        1200 => libc::B1200,
        1800 => libc::B1800,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        460_800 => libc::B460800,
        500_000 => libc::B500000,
        576_000 => libc::B576000,
        921_600 => libc::B921600,
        1_000_000 => libc::B1000000,
        1_152_000 => libc::B1152000,
        1_500_000 => libc::B1500000,
        2_000_000 => libc::B2000000,
        2_500_000 => libc::B2500000,
        3_000_000 => libc::B3000000,
        3_500_000 => libc::B3500000,
        4_000_000 => libc::B4000000,
        _ => return None,
    };
    Some(speed)
}

/// Raw-mode line configuration: cfmakeraw + speed + frame format + VMIN=1
/// VTIME=1, then flush both directions.
fn configure_termios(fd: libc::c_int, config: &SerialConfig) -> std::io::Result<()> {
    // SAFETY: `cfg` is a valid termios out-pointer and `fd` is an open
    // descriptor for the duration of every call below.
    unsafe {
        let mut cfg: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut cfg) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        libc::cfmakeraw(&mut cfg);

        let speed = baud_to_speed(config.baud_rate).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "baud rate not in rate table")
        })?;
        if libc::cfsetispeed(&mut cfg, speed) == -1 || libc::cfsetospeed(&mut cfg, speed) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        cfg.c_cflag &= !libc::CSIZE;
        cfg.c_cflag |= match config.data_bits {
            DataBits::Five => libc::CS5,
            DataBits::Six => libc::CS6,
            DataBits::Seven => libc::CS7,
            DataBits::Eight => libc::CS8,
        };

        match config.parity {
            Parity::None => cfg.c_cflag &= !libc::PARENB,
            Parity::Odd => cfg.c_cflag |= libc::PARENB | libc::PARODD,
            Parity::Even => {
                cfg.c_cflag |= libc::PARENB;
                cfg.c_cflag &= !libc::PARODD;
            }
        }

        match config.stop_bits {
            StopBits::One => cfg.c_cflag &= !libc::CSTOPB,
            StopBits::Two => cfg.c_cflag |= libc::CSTOPB,
        }

        // Enable receiver, ignore modem control lines.
        cfg.c_cflag |= libc::CLOCAL | libc::CREAD;

        // Block for at least one byte, with a 100ms inter-byte timeout.
        cfg.c_cc[libc::VMIN] = 1;
        cfg.c_cc[libc::VTIME] = 1;

        if libc::tcsetattr(fd, libc::TCSANOW, &cfg) == -1 {
            return Err(std::io::Error::last_os_error());
        }

        // Discard anything queued before configuration took effect.
        libc::tcflush(fd, libc::TCIOFLUSH);
    }
    Ok(())
}

/// An opened, configured serial byte channel — blocking `Read` + `Write`.
///
/// [`try_clone`] duplicates the descriptor so the read and write paths can
/// own independent handles and proceed concurrently.
///
/// [`try_clone`]: SerialStream::try_clone
pub struct SerialStream {
    file: File,
}

impl SerialStream {
    /// Duplicate the underlying descriptor (dup).
    pub fn try_clone(&self) -> Result<Self> {
        let file = self.file.try_clone()?;
        Ok(Self { file })
    }

    /// Close the descriptor, reporting the OS error instead of swallowing
    /// it the way a plain drop would.
    pub fn close(self) -> Result<()> {
        let fd = self.file.into_raw_fd();
        debug!(fd, "closing serial descriptor");
        // SAFETY: `into_raw_fd` released ownership; this is the sole close.
        let rc = unsafe { libc::close(fd) };
        if rc == -1 {
            return Err(TransportError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}
