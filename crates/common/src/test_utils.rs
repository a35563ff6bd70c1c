//! Test utilities for hid-terminal
//!
//! Provides in-memory stand-ins for the operator and the device so the
//! selector and transfer loop can be driven without hardware.
//!
//! # Example
//!
//! ```
//! use common::test_utils::{ScriptedOperator, create_mock_device_list};
//!
//! let devices = create_mock_device_list(2);
//! assert_eq!(devices.len(), 2);
//!
//! let operator = ScriptedOperator::new(["0"]);
//! assert!(operator.prompts().is_empty());
//! ```

use crate::console::{Operator, Prompted};
use crate::error::TransferError;
use crate::frame::ByteFrame;
use crate::transport::FrameTransport;
use crate::usb_types::{DeviceSummary, EndpointInfo, EndpointKind, EndpointPair};
use std::collections::VecDeque;

/// Create a mock DeviceSummary for testing
///
/// # Example
/// ```
/// use common::test_utils::create_mock_device;
///
/// let device = create_mock_device(1, 0x1234, 0x5678);
/// assert_eq!(device.vendor_id, 0x1234);
/// ```
pub fn create_mock_device(index: u8, vendor_id: u16, product_id: u16) -> DeviceSummary {
    DeviceSummary {
        vendor_id,
        product_id,
        bus_number: 1,
        address: index % 128,
    }
}

/// Create a list of mock devices with ascending ids
pub fn create_mock_device_list(count: u8) -> Vec<DeviceSummary> {
    (0..count)
        .map(|i| create_mock_device(i, 0x1000 + u16::from(i), 0x2000 + u16::from(i)))
        .collect()
}

/// Interrupt endpoints 0x01 (OUT) and 0x81 (IN, `in_max_packet` bytes)
pub fn create_mock_endpoints(in_max_packet: u16) -> EndpointPair {
    EndpointPair {
        out: EndpointInfo {
            address: 0x01,
            kind: EndpointKind::Interrupt,
            max_packet_size: 64,
        },
        input: EndpointInfo {
            address: 0x81,
            kind: EndpointKind::Interrupt,
            max_packet_size: in_max_packet,
        },
    }
}

/// Operator that replays a fixed script and cancels once it runs out
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    script: VecDeque<Prompted>,
    prompts: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines
                .into_iter()
                .map(|l| Prompted::Line(l.into()))
                .collect(),
            prompts: Vec::new(),
        }
    }

    /// Queue an explicit cancellation after the scripted lines
    pub fn then_cancel(mut self) -> Self {
        self.script.push_back(Prompted::Cancelled);
        self
    }

    /// Every prompt shown so far, in order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Scripted answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Operator for ScriptedOperator {
    fn prompt(&mut self, prompt: &str) -> crate::Result<Prompted> {
        self.prompts.push(prompt.to_string());
        Ok(self.script.pop_front().unwrap_or(Prompted::Cancelled))
    }
}

/// A write observed by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub endpoint: u8,
    pub data: Vec<u8>,
}

/// A read observed by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRead {
    pub endpoint: u8,
    pub max_len: usize,
}

/// Device stand-in that records transfers and replays scripted results
///
/// Writes succeed with the full length and reads return an empty frame
/// unless a result was queued.
#[derive(Debug, Default)]
pub struct MockTransport {
    write_results: VecDeque<Result<usize, TransferError>>,
    read_results: VecDeque<Result<Vec<u8>, TransferError>>,
    writes: Vec<RecordedWrite>,
    reads: Vec<RecordedRead>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_write_result(&mut self, result: Result<usize, TransferError>) -> &mut Self {
        self.write_results.push_back(result);
        self
    }

    pub fn push_read_result(&mut self, result: Result<Vec<u8>, TransferError>) -> &mut Self {
        self.read_results.push_back(result);
        self
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn reads(&self) -> &[RecordedRead] {
        &self.reads
    }
}

impl FrameTransport for MockTransport {
    fn write_frame(
        &mut self,
        endpoint: &EndpointInfo,
        data: &[u8],
    ) -> Result<usize, TransferError> {
        self.writes.push(RecordedWrite {
            endpoint: endpoint.address,
            data: data.to_vec(),
        });
        self.write_results.pop_front().unwrap_or(Ok(data.len()))
    }

    fn read_frame(
        &mut self,
        endpoint: &EndpointInfo,
        max_len: usize,
    ) -> Result<ByteFrame, TransferError> {
        self.reads.push(RecordedRead {
            endpoint: endpoint.address,
            max_len,
        });
        self.read_results
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
            .map(ByteFrame::from)
    }
}
