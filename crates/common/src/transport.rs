//! Blocking frame transport over the negotiated endpoints

use crate::error::TransferError;
use crate::frame::ByteFrame;
use crate::usb_types::EndpointInfo;

/// One write or one read against an endpoint of the open device
pub trait FrameTransport {
    /// Write `data` to an OUT endpoint, returning the number of bytes sent
    fn write_frame(&mut self, endpoint: &EndpointInfo, data: &[u8])
    -> Result<usize, TransferError>;

    /// Read at most `max_len` bytes from an IN endpoint
    fn read_frame(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
    ) -> Result<ByteFrame, TransferError>;
}
