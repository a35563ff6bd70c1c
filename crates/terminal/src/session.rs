//! Interactive transfer loop
//!
//! Each iteration reads one line of hex from the operator, writes it to the
//! OUT endpoint and reads one reply from the IN endpoint. Bad input and
//! failed transfers are reported inline and the loop carries on; only an
//! operator cancel ends it.

use anyhow::Result;
use common::{
    ByteFrame, EndpointPair, FrameError, FrameTransport, Operator, Prompted, TransferError,
};
use std::io::Write;
use tracing::{debug, info};

pub const INPUT_PROMPT: &str = "> ";
pub const INVALID_DATA: &str = "Invalid data!";
pub const DATA_NOT_SENT: &str = "Data not sent!";

/// The open device and its endpoints, threaded through every iteration
pub struct SessionContext<T: FrameTransport> {
    transport: T,
    endpoints: EndpointPair,
}

impl<T: FrameTransport> SessionContext<T> {
    pub fn new(transport: T, endpoints: EndpointPair) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One write followed by exactly one read of the IN max packet size
    fn exchange(&mut self, frame: &ByteFrame) -> Result<ByteFrame, TransferError> {
        let written = self
            .transport
            .write_frame(&self.endpoints.out, frame.as_bytes())?;
        debug!("Wrote {} of {} bytes", written, frame.len());

        let max_len = usize::from(self.endpoints.input.max_packet_size);
        self.transport.read_frame(&self.endpoints.input, max_len)
    }
}

/// What a single iteration did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Exchanged { sent: ByteFrame, received: ByteFrame },
    InvalidInput(FrameError),
    TransferFailed(TransferError),
    Cancelled,
}

/// Run iterations until the operator cancels
pub fn run_transfer_loop<T, O, W>(
    ctx: &mut SessionContext<T>,
    operator: &mut O,
    out: &mut W,
) -> Result<()>
where
    T: FrameTransport,
    O: Operator,
    W: Write,
{
    writeln!(out)?;
    writeln!(out, "Enter hex data to send:")?;
    out.flush()?;

    loop {
        match step(ctx, operator, out)? {
            Step::Cancelled => {
                info!("Session cancelled by operator");
                return Ok(());
            }
            Step::Exchanged { sent, received } => {
                debug!("Exchanged {} bytes out, {} bytes in", sent.len(), received.len())
            }
            Step::InvalidInput(e) => debug!("Input rejected: {}", e),
            Step::TransferFailed(e) => debug!("Transfer failed: {}", e),
        }
    }
}

/// AwaitingInput -> Parsing -> Transferring, once
pub fn step<T, O, W>(ctx: &mut SessionContext<T>, operator: &mut O, out: &mut W) -> Result<Step>
where
    T: FrameTransport,
    O: Operator,
    W: Write,
{
    let line = match operator.prompt(INPUT_PROMPT)? {
        Prompted::Line(line) => line,
        Prompted::Cancelled => return Ok(Step::Cancelled),
    };

    let frame = match ByteFrame::from_hex(&line) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Rejected input {:?}: {}", line, e);
            writeln!(out, "{}", INVALID_DATA)?;
            out.flush()?;
            return Ok(Step::InvalidInput(e));
        }
    };

    writeln!(out, "OUT: {}", frame)?;
    out.flush()?;

    let step = match ctx.exchange(&frame) {
        Ok(received) => {
            writeln!(out, "IN: {}", received)?;
            Step::Exchanged {
                sent: frame,
                received,
            }
        }
        Err(e) => {
            writeln!(out, "{}", DATA_NOT_SENT)?;
            Step::TransferFailed(e)
        }
    };
    out.flush()?;

    Ok(step)
}
