//! USB type abstractions shared by the selector, negotiator and transfer loop

use crate::error::SetupError;
use std::fmt;

/// Bit 7 of an endpoint address: set for IN (device to host)
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// A device seen during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub address: u8,
}

impl DeviceSummary {
    /// Identifiers used to reopen the device after selection
    pub fn ids(&self) -> DeviceIds {
        DeviceIds {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        }
    }
}

/// Vendor/product pair identifying the selected device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIds {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIds {
    /// Parse `VID:PID` with hex halves, `0x` prefix optional
    pub fn parse(s: &str) -> Option<Self> {
        let (vid, pid) = s.trim().split_once(':')?;
        Some(Self {
            vendor_id: parse_hex_u16(vid)?,
            product_id: parse_hex_u16(pid)?,
        })
    }
}

impl fmt::Display for DeviceIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

fn parse_hex_u16(s: &str) -> Option<u16> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Endpoint direction, derived from the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

impl Direction {
    pub fn from_address(address: u8) -> Self {
        if address & ENDPOINT_DIR_IN != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

/// Transfer type from the endpoint's bmAttributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

/// One endpoint descriptor of the default interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub kind: EndpointKind,
    pub max_packet_size: u16,
}

impl EndpointInfo {
    pub fn direction(&self) -> Direction {
        Direction::from_address(self.address)
    }
}

/// The OUT endpoint used for writes and the IN endpoint used for reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPair {
    pub out: EndpointInfo,
    pub input: EndpointInfo,
}

impl EndpointPair {
    /// Pick the first OUT and the first IN endpoint, in descriptor order
    pub fn find_default(endpoints: &[EndpointInfo]) -> Result<Self, SetupError> {
        let out = endpoints
            .iter()
            .find(|ep| ep.direction() == Direction::Out);
        let input = endpoints.iter().find(|ep| ep.direction() == Direction::In);

        match (out, input) {
            (Some(out), Some(input)) => Ok(Self {
                out: *out,
                input: *input,
            }),
            _ => Err(SetupError::MissingEndpoints),
        }
    }
}

/// Device filter pattern (`0x1234:0x5678`, `0x1234:*`, `*:*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl DeviceFilter {
    /// Parse a filter; each half is `*` or a `0x`-prefixed 1-4 digit hex id
    pub fn parse(filter: &str) -> Result<Self, String> {
        let parts: Vec<&str> = filter.split(':').collect();
        let [vid, pid] = parts.as_slice() else {
            return Err(format!(
                "Invalid filter format '{}', expected VID:PID (e.g., '0x1234:0x5678' or '0x1234:*')",
                filter
            ));
        };

        Ok(Self {
            vendor_id: Self::parse_half(vid, "VID")?,
            product_id: Self::parse_half(pid, "PID")?,
        })
    }

    fn parse_half(id: &str, name: &str) -> Result<Option<u16>, String> {
        if id == "*" {
            return Ok(None);
        }

        let Some(hex_part) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) else {
            return Err(format!(
                "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                name, id
            ));
        };

        if hex_part.is_empty() || hex_part.len() > 4 {
            return Err(format!(
                "Invalid {} '{}', hex part must be 1-4 digits",
                name, id
            ));
        }

        u16::from_str_radix(hex_part, 16)
            .map(Some)
            .map_err(|_| format!("Invalid {} '{}', not a valid hex number", name, id))
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id.is_none_or(|v| v == vendor_id)
            && self.product_id.is_none_or(|p| p == product_id)
    }
}

/// True when `filters` is empty or any filter matches
pub fn is_device_allowed(filters: &[DeviceFilter], vendor_id: u16, product_id: u16) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(vendor_id, product_id))
}
