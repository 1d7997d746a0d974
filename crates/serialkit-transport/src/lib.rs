//! Serial device transport layer.
//!
//! Opens and configures a serial/UART device node via POSIX termios and
//! hands back a [`SerialStream`]: a blocking byte channel that higher layers
//! read raw chunks from and write bytes to.
//!
//! This is the lowest layer of serialkit. Everything else builds on top of
//! the [`SerialStream`] type provided here.

pub mod config;
pub mod error;
pub mod finder;
pub mod permissions;

#[cfg(unix)]
pub mod port;

pub use config::{DataBits, Parity, SerialConfig, StopBits};
pub use error::{Result, TransportError};
pub use finder::SerialPortFinder;

#[cfg(unix)]
pub use port::{SerialPort, SerialStream};
