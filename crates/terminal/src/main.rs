//! hid-terminal
//!
//! Interactive tool for exchanging raw byte frames with a USB HID device
//! over its default IN and OUT endpoints. Intended for bringing up new
//! device firmware by hand.

mod config;
mod selector;
mod session;
mod usb;

use anyhow::{Context, Result};
use clap::Parser;
use common::{ConsoleOperator, DeviceIds, SetupError, setup_logging};
use selector::Selection;
use session::SessionContext;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, info};
use usb::DeviceSession;

#[derive(Parser, Debug)]
#[command(name = "hid-terminal")]
#[command(
    author,
    version,
    about = "USB HID terminal - send and receive raw frames on a device's default endpoints"
)]
#[command(long_about = "
Sends operator-entered hex frames to the first OUT endpoint of a USB device
and prints the reply read from its first IN endpoint.

EXAMPLES:
    # Pick a device interactively
    hid-terminal

    # Open a known device directly
    hid-terminal --device 0x1234:0x5678

    # List USB devices and exit
    hid-terminal --list-devices

    # Longer transfer timeout with debug logging
    hid-terminal --timeout 5000 --log-level debug

CONFIGURATION:
    The terminal looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/hid-terminal/terminal.toml
    3. /etc/hid-terminal/terminal.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Open this device instead of prompting (VID:PID in hex)
    #[arg(short, long, value_name = "VID:PID", value_parser = parse_device_ids)]
    device: Option<DeviceIds>,

    /// Transfer timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn parse_device_ids(s: &str) -> std::result::Result<DeviceIds, String> {
    DeviceIds::parse(s).ok_or_else(|| format!("invalid device '{}', expected VID:PID", s))
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(setup) = e.downcast_ref::<SetupError>() {
                debug!("Setup failed: {:?}", setup);
                eprintln!("{}", setup);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.save_config {
        let config = config::TerminalConfig::default();
        let path = config::TerminalConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        config::TerminalConfig::load_from(path).context("Failed to load configuration")?
    } else {
        config::TerminalConfig::load_or_default()
    };

    if let Some(timeout_ms) = args.timeout {
        config.usb.timeout_ms = timeout_ms;
    }
    if let Some(level) = args.log_level {
        config.terminal.log_level = level;
    }
    config.validate()?;

    setup_logging(&config.terminal.log_level).context("Failed to setup logging")?;
    info!("hid-terminal v{}", env!("CARGO_PKG_VERSION"));

    let filters = config.filters()?;
    let context = rusb::Context::new().context("Failed to initialize libusb")?;
    let mut stdout = io::stdout();

    if args.list_devices {
        let devices =
            usb::enumerate_devices(&context, &filters).context("Failed to enumerate USB devices")?;
        selector::require_devices(&devices)?;
        return selector::print_devices(&devices, &mut stdout);
    }

    // stdin is only read once there is something to ask the operator
    let (ids, operator) = match args.device {
        Some(ids) => (ids, None),
        None => {
            let devices = usb::enumerate_devices(&context, &filters)
                .context("Failed to enumerate USB devices")?;
            selector::require_devices(&devices)?;

            let mut operator = ConsoleOperator::spawn().context("Failed to start console")?;
            match selector::select_device(&devices, &mut operator, &mut stdout)? {
                Selection::Selected(ids) => (ids, Some(operator)),
                Selection::Cancelled => return cancelled(&mut stdout),
            }
        }
    };

    let device = DeviceSession::open(&context, ids, config.timeout())?;
    let endpoints = device.endpoints();
    let mut ctx = SessionContext::new(device, endpoints);

    let mut operator = match operator {
        Some(operator) => operator,
        None => ConsoleOperator::spawn().context("Failed to start console")?,
    };

    session::run_transfer_loop(&mut ctx, &mut operator, &mut stdout)?;
    drop(ctx);

    cancelled(&mut stdout)
}

/// Operator cancelled: print only a newline and exit cleanly
fn cancelled<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
