//! Common error types

use thiserror::Error;

/// Plumbing errors (configuration, logging, terminal I/O)
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Console error: {0}")]
    Console(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors raised while selecting and opening the device.
///
/// The `Display` text is what the operator sees before the process exits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("No USB HID Device found!")]
    NoDevices,

    #[error("Device connection error!")]
    DeviceNotFound,

    #[error("Could not detach kernel driver: {0}")]
    KernelDriver(String),

    #[error("Can't access USB device. Please create udev file or start with sudo!")]
    Access,

    #[error("Couldn't find default IO endpoints of device!")]
    MissingEndpoints,
}

/// Operator hex text that does not describe a byte frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("odd-length hex input ({len} bytes)")]
    OddLength { len: usize },

    #[error("invalid hex digit {digit:?} at position {index}")]
    InvalidDigit { digit: char, index: usize },
}

/// Driver-level failure of a single write or read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Transfer timed out
    #[error("transfer timed out")]
    Timeout,
    /// Endpoint stalled
    #[error("endpoint stalled")]
    Pipe,
    /// Device was disconnected
    #[error("device disconnected")]
    NoDevice,
    /// Device or endpoint not found
    #[error("device or endpoint not found")]
    NotFound,
    /// Device is busy
    #[error("device busy")]
    Busy,
    /// Device sent more data than requested
    #[error("buffer overflow")]
    Overflow,
    /// I/O error
    #[error("I/O error")]
    Io,
    /// Invalid parameter
    #[error("invalid parameter")]
    InvalidParam,
    /// Access denied (permissions)
    #[error("access denied")]
    Access,
    /// Other error with message
    #[error("{message}")]
    Other { message: String },
}
