//! USB device enumeration
//!
//! Lists the devices visible to libusb and re-locates the selected one by
//! vendor/product id. The handle used to list devices is never reused for
//! transfers; the session reopens the device from its ids.

use common::usb_types::is_device_allowed;
use common::{DeviceFilter, DeviceIds, DeviceSummary, SetupError};
use rusb::{Context, Device, UsbContext};
use tracing::{debug, warn};

/// Enumerate all currently connected USB devices that pass `filters`
pub fn enumerate_devices(
    context: &Context,
    filters: &[DeviceFilter],
) -> Result<Vec<DeviceSummary>, rusb::Error> {
    let devices = context.devices()?;
    let mut summaries = Vec::new();

    for device in devices.iter() {
        let descriptor = match device.device_descriptor() {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    "Skipping device bus={} addr={}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                );
                continue;
            }
        };

        if !is_device_allowed(filters, descriptor.vendor_id(), descriptor.product_id()) {
            debug!(
                "Device ignored by filter: bus={}, addr={}, vid={:#x}, pid={:#x}",
                device.bus_number(),
                device.address(),
                descriptor.vendor_id(),
                descriptor.product_id()
            );
            continue;
        }

        summaries.push(DeviceSummary {
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            bus_number: device.bus_number(),
            address: device.address(),
        });
    }

    debug!("Enumerated {} devices", summaries.len());
    Ok(summaries)
}

/// Find the first attached device with the given ids
pub fn find_device(context: &Context, ids: DeviceIds) -> Result<Device<Context>, SetupError> {
    let devices = context.devices().map_err(|e| {
        warn!("Failed to list USB devices: {}", e);
        SetupError::Access
    })?;

    devices
        .iter()
        .find(|device| {
            device.device_descriptor().is_ok_and(|d| {
                d.vendor_id() == ids.vendor_id && d.product_id() == ids.product_id
            })
        })
        .inspect(|device| {
            debug!(
                "Found device {} on bus {} address {}",
                ids,
                device.bus_number(),
                device.address()
            )
        })
        .ok_or_else(|| {
            warn!("Device {} is no longer attached", ids);
            SetupError::DeviceNotFound
        })
}
