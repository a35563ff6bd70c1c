//! Byte frames and their hex text form
//!
//! Outbound frames are typed by the operator as hex text, two digits per
//! byte, with optional spaces anywhere. Both directions are echoed back as
//! lower-case two-digit groups, each followed by a single space.

use crate::error::FrameError;
use std::fmt;

/// An ordered sequence of bytes sent to or received from the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteFrame(Vec<u8>);

impl ByteFrame {
    /// Parse operator hex text into a frame
    ///
    /// Space characters are removed first. The remaining text must have an
    /// even number of characters, all of them hex digits. The empty string
    /// is a valid zero-length frame.
    pub fn from_hex(text: &str) -> Result<Self, FrameError> {
        let stripped: String = text.chars().filter(|c| *c != ' ').collect();

        hex::decode(&stripped).map(Self).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                FrameError::InvalidDigit { digit: c, index }
            }
            _ => FrameError::OddLength { len: stripped.len() },
        })
    }

    /// Render as `"ab 12 "`: two lower-case digits and a space per byte
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 3);
        for byte in &self.0 {
            out.push_str(&format!("{:02x} ", byte));
        }
        out
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ByteFrame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ByteFrame {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for ByteFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
