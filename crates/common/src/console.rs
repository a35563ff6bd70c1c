//! Operator console
//!
//! Lines typed by the operator, end of input and Ctrl-C all arrive on one
//! channel. A reader thread forwards stdin and the Ctrl-C handler forwards
//! an interrupt marker, so the main thread only ever blocks in
//! [`Operator::prompt`] and cancellation unwinds normally through `Drop`.

use async_channel::{Receiver, Sender, unbounded};
use std::io::{self, BufRead, Write};
use std::thread;
use tracing::{debug, warn};

/// Result of prompting the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted {
    /// A line of input, without the line terminator
    Line(String),
    /// Ctrl-C or end of input
    Cancelled,
}

/// Source of operator input
pub trait Operator {
    /// Show `prompt` and block until the operator answers or cancels
    fn prompt(&mut self, prompt: &str) -> crate::Result<Prompted>;
}

#[derive(Debug, PartialEq, Eq)]
enum ConsoleInput {
    Line(String),
    Eof,
    Interrupt,
}

/// Interactive stdin/stdout operator
pub struct ConsoleOperator {
    input_rx: Receiver<ConsoleInput>,
}

impl ConsoleOperator {
    /// Install the Ctrl-C handler and start the stdin reader thread
    ///
    /// The Ctrl-C handler is process-wide, so this may only be called once.
    pub fn spawn() -> crate::Result<Self> {
        let (input_tx, input_rx) = unbounded();

        let interrupt_tx = input_tx.clone();
        ctrlc::set_handler(move || {
            if interrupt_tx.send_blocking(ConsoleInput::Interrupt).is_err() {
                debug!("Console closed, dropping interrupt");
            }
        })
        .map_err(|e| crate::Error::Console(format!("Failed to install Ctrl-C handler: {}", e)))?;

        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || read_input(io::stdin().lock(), input_tx))?;

        Ok(Self { input_rx })
    }
}

impl Operator for ConsoleOperator {
    fn prompt(&mut self, prompt: &str) -> crate::Result<Prompted> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        match self.input_rx.recv_blocking() {
            Ok(ConsoleInput::Line(line)) => Ok(Prompted::Line(line)),
            Ok(ConsoleInput::Interrupt) => {
                debug!("Operator interrupt");
                Ok(Prompted::Cancelled)
            }
            Ok(ConsoleInput::Eof) | Err(_) => {
                debug!("End of operator input");
                Ok(Prompted::Cancelled)
            }
        }
    }
}

/// Forward lines from `reader` until end of input
///
/// Bytes that are not UTF-8 are replaced rather than ending the session, so
/// the line reaches the frame parser and is rejected there.
fn read_input<R: BufRead>(mut reader: R, input_tx: Sender<ConsoleInput>) {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let message = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => ConsoleInput::Eof,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                ConsoleInput::Line(line.trim_end_matches(['\r', '\n']).to_string())
            }
            Err(e) => {
                warn!("Failed to read from stdin: {}", e);
                ConsoleInput::Eof
            }
        };

        let done = matches!(message, ConsoleInput::Eof);
        if input_tx.send_blocking(message).is_err() || done {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &[u8]) -> Vec<ConsoleInput> {
        let (tx, rx) = unbounded();
        read_input(Cursor::new(input.to_vec()), tx);
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_lines_are_forwarded_without_terminators() {
        assert_eq!(
            read_all(b"ab12\r\n01\n"),
            [
                ConsoleInput::Line("ab12".to_string()),
                ConsoleInput::Line("01".to_string()),
                ConsoleInput::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_input() {
        let inputs = read_all(b"\xff\xfe\n01\n");

        assert_eq!(
            inputs,
            [
                ConsoleInput::Line("\u{fffd}\u{fffd}".to_string()),
                ConsoleInput::Line("01".to_string()),
                ConsoleInput::Eof,
            ]
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        assert_eq!(
            read_all(b"ab"),
            [ConsoleInput::Line("ab".to_string()), ConsoleInput::Eof]
        );
    }

    #[test]
    fn test_prompt_maps_console_input() {
        let (tx, input_rx) = unbounded();
        read_input(Cursor::new(b"\xff\n01\n".to_vec()), tx);
        let mut operator = ConsoleOperator { input_rx };

        assert_eq!(
            operator.prompt("> ").unwrap(),
            Prompted::Line("\u{fffd}".to_string())
        );
        assert_eq!(
            operator.prompt("> ").unwrap(),
            Prompted::Line("01".to_string())
        );
        assert_eq!(operator.prompt("> ").unwrap(), Prompted::Cancelled);
        assert_eq!(operator.prompt("> ").unwrap(), Prompted::Cancelled);
    }
}
