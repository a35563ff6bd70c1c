//! Common utilities for hid-terminal
//!
//! This crate provides the pieces of the terminal that do not touch libusb:
//! error types, logging setup, the hex frame codec, endpoint and device
//! types, the operator console and the transport seam used by the transfer
//! loop.

pub mod console;
pub mod error;
pub mod frame;
pub mod logging;
pub mod test_utils;
pub mod transport;
pub mod usb_types;

pub use console::{ConsoleOperator, Operator, Prompted};
pub use error::{Error, FrameError, Result, SetupError, TransferError};
pub use frame::ByteFrame;
pub use logging::setup_logging;
pub use transport::FrameTransport;
pub use usb_types::{
    DeviceFilter, DeviceIds, DeviceSummary, Direction, EndpointInfo, EndpointKind, EndpointPair,
};
