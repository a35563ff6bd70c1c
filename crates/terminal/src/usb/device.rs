//! Open device session
//!
//! Wraps the libusb handle for the selected device together with the
//! negotiated endpoints. The session owns everything it changed on the
//! device: dropping it releases interface 0 and hands the interface back to
//! the kernel driver if one was detached.

use crate::usb::manager::find_device;
use crate::usb::transfers::{map_transfer_type, read_endpoint, write_endpoint};
use common::{
    ByteFrame, DeviceIds, EndpointInfo, EndpointPair, FrameTransport, SetupError, TransferError,
};
use rusb::{Context, Device, DeviceHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interface searched for endpoints and detached from the kernel
pub const DEFAULT_INTERFACE: u8 = 0;
/// Alternate setting searched for endpoints
pub const DEFAULT_ALT_SETTING: u8 = 0;

/// What a session changed on the device and has to undo when it ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Claims {
    kernel_driver_detached: bool,
    interface_claimed: bool,
}

/// Exclusive access to the selected device for the length of a session
pub struct DeviceSession {
    handle: DeviceHandle<Context>,
    ids: DeviceIds,
    endpoints: EndpointPair,
    timeout: Duration,
    claims: Claims,
}

impl DeviceSession {
    /// Reopen the device by ids and prepare it for transfers
    ///
    /// Detaches a kernel driver bound to interface 0, locates the default
    /// endpoints and claims the interface. A driver detached here is
    /// re-attached if a later step fails.
    pub fn open(context: &Context, ids: DeviceIds, timeout: Duration) -> Result<Self, SetupError> {
        let device = find_device(context, ids)?;

        let mut handle = device.open().map_err(|e| {
            warn!("Failed to open device {}: {}", ids, e);
            SetupError::Access
        })?;
        debug!("Opened device {}", ids);

        let active = handle.kernel_driver_active(DEFAULT_INTERFACE);
        let mut claims = Claims {
            kernel_driver_detached: detach_kernel_driver(active, || {
                handle.detach_kernel_driver(DEFAULT_INTERFACE)
            })?,
            interface_claimed: false,
        };

        let endpoints = match default_endpoints(&device) {
            Ok(endpoints) => endpoints,
            Err(e) => {
                restore_device(&mut handle, &mut claims);
                return Err(e);
            }
        };
        debug!(
            "Default endpoints: out={:#x} in={:#x} (max packet {})",
            endpoints.out.address, endpoints.input.address, endpoints.input.max_packet_size
        );

        let mut session = Self {
            handle,
            ids,
            endpoints,
            timeout,
            claims,
        };
        session.claim_interface()?;

        info!("Device {} ready", ids);
        Ok(session)
    }

    pub fn endpoints(&self) -> EndpointPair {
        self.endpoints
    }

    fn claim_interface(&mut self) -> Result<(), SetupError> {
        self.handle
            .claim_interface(DEFAULT_INTERFACE)
            .map_err(|e| {
                warn!("Failed to claim interface {}: {}", DEFAULT_INTERFACE, e);
                SetupError::Access
            })?;

        self.claims.interface_claimed = true;
        debug!("Claimed interface {} on device {}", DEFAULT_INTERFACE, self.ids);
        Ok(())
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        restore_device(&mut self.handle, &mut self.claims);
        debug!("Closed device {}", self.ids);
    }
}

impl FrameTransport for DeviceSession {
    fn write_frame(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
    ) -> Result<usize, TransferError> {
        write_endpoint(&self.handle, endpoint, data, self.timeout)
    }

    fn read_frame(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
    ) -> Result<ByteFrame, TransferError> {
        read_endpoint(&self.handle, endpoint, max_len, self.timeout)
    }
}

/// Interface operations used to hand the device back on close
trait InterfaceControl {
    fn release_interface(&mut self, iface: u8) -> rusb::Result<()>;
    fn attach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()>;
}

impl InterfaceControl for DeviceHandle<Context> {
    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, iface)
    }

    fn attach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, iface)
    }
}

/// Release the interface and re-attach the kernel driver, if this session
/// claimed or detached them. Failures are logged only.
fn restore_device<H: InterfaceControl>(handle: &mut H, claims: &mut Claims) {
    if claims.interface_claimed {
        if let Err(e) = handle.release_interface(DEFAULT_INTERFACE) {
            warn!("Failed to release interface {}: {}", DEFAULT_INTERFACE, e);
        }
        claims.interface_claimed = false;
    }

    if claims.kernel_driver_detached {
        match handle.attach_kernel_driver(DEFAULT_INTERFACE) {
            Ok(()) => debug!("Reattached kernel driver to interface {}", DEFAULT_INTERFACE),
            Err(e) => warn!(
                "Could not reattach kernel driver to interface {}: {}",
                DEFAULT_INTERFACE, e
            ),
        }
        claims.kernel_driver_detached = false;
    }
}

/// Act on the kernel driver query for interface 0, returning whether a
/// driver was detached
fn detach_kernel_driver<F>(active: rusb::Result<bool>, detach: F) -> Result<bool, SetupError>
where
    F: FnOnce() -> rusb::Result<()>,
{
    match active {
        Ok(true) => {
            debug!(
                "Detaching kernel driver from interface {}",
                DEFAULT_INTERFACE
            );
            detach().map_err(|e| SetupError::KernelDriver(e.to_string()))?;
            Ok(true)
        }
        Ok(false) => {
            debug!("No kernel driver active on interface {}", DEFAULT_INTERFACE);
            Ok(false)
        }
        Err(rusb::Error::NotSupported) => {
            debug!("Kernel driver queries not supported on this platform");
            Ok(false)
        }
        Err(e) => {
            warn!(
                "Could not check kernel driver status for interface {}: {}",
                DEFAULT_INTERFACE, e
            );
            Err(SetupError::Access)
        }
    }
}

/// First OUT and first IN endpoint of interface 0, alternate setting 0
fn default_endpoints(device: &Device<Context>) -> Result<EndpointPair, SetupError> {
    let config = device.active_config_descriptor().map_err(|e| {
        warn!("Failed to get active config descriptor: {}", e);
        SetupError::Access
    })?;

    let settings = config
        .interfaces()
        .flat_map(|interface| interface.descriptors())
        .map(|alt| {
            let endpoints: Vec<EndpointInfo> = alt
                .endpoint_descriptors()
                .map(|ep| EndpointInfo {
                    address: ep.address(),
                    kind: map_transfer_type(ep.transfer_type()),
                    max_packet_size: ep.max_packet_size(),
                })
                .collect();
            (alt.interface_number(), alt.setting_number(), endpoints)
        });

    select_default_endpoints(settings)
}

/// Pick the endpoint pair from `(interface, alternate setting, endpoints)`
/// entries. Only interface 0 alternate setting 0 is considered.
fn select_default_endpoints<I>(settings: I) -> Result<EndpointPair, SetupError>
where
    I: IntoIterator<Item = (u8, u8, Vec<EndpointInfo>)>,
{
    let (_, _, endpoints) = settings
        .into_iter()
        .find(|(interface, setting, _)| {
            *interface == DEFAULT_INTERFACE && *setting == DEFAULT_ALT_SETTING
        })
        .ok_or(SetupError::MissingEndpoints)?;

    EndpointPair::find_default(&endpoints)
}
