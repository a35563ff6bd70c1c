//! USB transfer execution
//!
//! Blocking writes and reads on the negotiated endpoints. Interrupt
//! endpoints get interrupt transfers; everything else goes out as bulk.

use common::{ByteFrame, EndpointInfo, EndpointKind, TransferError};
use rusb::{Context, DeviceHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Write `data` to an OUT endpoint
pub fn write_endpoint(
    handle: &DeviceHandle<Context>,
    endpoint: &EndpointInfo,
    data: &[u8],
    timeout: Duration,
) -> Result<usize, TransferError> {
    debug!(
        "Write: endpoint={:#x}, kind={:?}, data_len={}, timeout={}ms",
        endpoint.address,
        endpoint.kind,
        data.len(),
        timeout.as_millis()
    );

    let result = match endpoint.kind {
        EndpointKind::Interrupt => handle.write_interrupt(endpoint.address, data, timeout),
        _ => handle.write_bulk(endpoint.address, data, timeout),
    };

    match result {
        Ok(len) => {
            debug!("Write succeeded: {} of {} bytes", len, data.len());
            Ok(len)
        }
        Err(e) => {
            let error = map_rusb_error(e);
            warn!("Write to endpoint {:#x} failed: {:?}", endpoint.address, error);
            Err(error)
        }
    }
}

/// Read up to `max_len` bytes from an IN endpoint
pub fn read_endpoint(
    handle: &DeviceHandle<Context>,
    endpoint: &EndpointInfo,
    max_len: usize,
    timeout: Duration,
) -> Result<ByteFrame, TransferError> {
    debug!(
        "Read: endpoint={:#x}, kind={:?}, max_len={}, timeout={}ms",
        endpoint.address,
        endpoint.kind,
        max_len,
        timeout.as_millis()
    );

    let mut buffer = vec![0u8; max_len];
    let result = match endpoint.kind {
        EndpointKind::Interrupt => handle.read_interrupt(endpoint.address, &mut buffer, timeout),
        _ => handle.read_bulk(endpoint.address, &mut buffer, timeout),
    };

    match result {
        Ok(len) => {
            buffer.truncate(len);
            debug!("Read succeeded: {} bytes", len);
            Ok(ByteFrame::from(buffer))
        }
        Err(e) => {
            let error = map_rusb_error(e);
            warn!(
                "Read from endpoint {:#x} failed: {:?}",
                endpoint.address, error
            );
            Err(error)
        }
    }
}

/// Map rusb::Error to TransferError
pub fn map_rusb_error(err: rusb::Error) -> TransferError {
    match err {
        rusb::Error::Timeout => TransferError::Timeout,
        rusb::Error::Pipe => TransferError::Pipe,
        rusb::Error::NoDevice => TransferError::NoDevice,
        rusb::Error::NotFound => TransferError::NotFound,
        rusb::Error::Busy => TransferError::Busy,
        rusb::Error::Overflow => TransferError::Overflow,
        rusb::Error::Io => TransferError::Io,
        rusb::Error::InvalidParam => TransferError::InvalidParam,
        rusb::Error::Access => TransferError::Access,
        _ => TransferError::Other {
            message: err.to_string(),
        },
    }
}

/// Map the descriptor's transfer type
pub fn map_transfer_type(kind: rusb::TransferType) -> EndpointKind {
    match kind {
        rusb::TransferType::Control => EndpointKind::Control,
        rusb::TransferType::Isochronous => EndpointKind::Isochronous,
        rusb::TransferType::Bulk => EndpointKind::Bulk,
        rusb::TransferType::Interrupt => EndpointKind::Interrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rusb_error() {
        assert_eq!(map_rusb_error(rusb::Error::Timeout), TransferError::Timeout);
        assert_eq!(map_rusb_error(rusb::Error::Pipe), TransferError::Pipe);
        assert_eq!(map_rusb_error(rusb::Error::NoDevice), TransferError::NoDevice);
        assert_eq!(map_rusb_error(rusb::Error::NotFound), TransferError::NotFound);
        assert!(matches!(
            map_rusb_error(rusb::Error::NoMem),
            TransferError::Other { .. }
        ));
    }

    #[test]
    fn test_map_transfer_type() {
        assert_eq!(
            map_transfer_type(rusb::TransferType::Interrupt),
            EndpointKind::Interrupt
        );
        assert_eq!(
            map_transfer_type(rusb::TransferType::Bulk),
            EndpointKind::Bulk
        );
    }
}
