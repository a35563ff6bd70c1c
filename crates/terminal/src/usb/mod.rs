//! USB subsystem
//!
//! Everything that talks to libusb through rusb:
//! - Device enumeration and re-location by vendor/product id
//! - Kernel driver detachment and interface claiming
//! - Default endpoint discovery
//! - Blocking interrupt/bulk transfers

pub mod device;
pub mod manager;
pub mod transfers;

pub use device::DeviceSession;
pub use manager::enumerate_devices;
