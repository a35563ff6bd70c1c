//! Device selection
//!
//! Prints the enumerated devices and asks the operator to pick one by index.

use anyhow::Result;
use common::{DeviceIds, DeviceSummary, Operator, Prompted, SetupError};
use std::io::Write;
use tracing::debug;

/// Outcome of the selection prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected(DeviceIds),
    Cancelled,
}

/// Print the numbered device list
///
/// Each line reads `<index>: VID 0x<vid>\tPID 0x<pid>`.
pub fn print_devices<W: Write>(devices: &[DeviceSummary], out: &mut W) -> Result<()> {
    writeln!(out, "----- HID Devices -----")?;
    for (index, device) in devices.iter().enumerate() {
        writeln!(
            out,
            "{}: VID {:#x}\tPID {:#x}",
            index, device.vendor_id, device.product_id
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Fail with [`SetupError::NoDevices`] when nothing was enumerated
pub fn require_devices(devices: &[DeviceSummary]) -> Result<(), SetupError> {
    if devices.is_empty() {
        return Err(SetupError::NoDevices);
    }
    Ok(())
}

/// List `devices` and prompt until the operator enters a valid index
///
/// Fails with [`SetupError::NoDevices`] before printing anything when the
/// list is empty. Non-numeric and out-of-range answers are re-prompted.
pub fn select_device<O, W>(devices: &[DeviceSummary], operator: &mut O, out: &mut W) -> Result<Selection>
where
    O: Operator,
    W: Write,
{
    require_devices(devices)?;
    print_devices(devices, out)?;

    let prompt = format!("Select device (0-{}): ", devices.len() - 1);
    loop {
        let line = match operator.prompt(&prompt)? {
            Prompted::Line(line) => line,
            Prompted::Cancelled => return Ok(Selection::Cancelled),
        };

        match parse_index(&line, devices.len()) {
            Some(index) => {
                let device = &devices[index];
                debug!(
                    "Selected device {} ({}) on bus {} address {}",
                    index,
                    device.ids(),
                    device.bus_number,
                    device.address
                );
                return Ok(Selection::Selected(device.ids()));
            }
            None => debug!("Rejected selection {:?}", line),
        }
    }
}

fn parse_index(line: &str, count: usize) -> Option<usize> {
    line.trim().parse::<usize>().ok().filter(|i| *i < count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::{ScriptedOperator, create_mock_device, create_mock_device_list};

    #[test]
    fn test_empty_list_is_fatal_without_output() {
        let mut operator = ScriptedOperator::new(["0"]);
        let mut out = Vec::new();

        let err = select_device(&[], &mut operator, &mut out).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SetupError>(),
            Some(&SetupError::NoDevices)
        );
        assert_eq!(err.to_string(), "No USB HID Device found!");
        assert!(out.is_empty());
        assert!(operator.prompts().is_empty());
    }

    #[test]
    fn test_require_devices() {
        assert_eq!(require_devices(&[]), Err(SetupError::NoDevices));
        assert_eq!(require_devices(&create_mock_device_list(1)), Ok(()));
    }

    #[test]
    fn test_device_list_format() {
        let devices = [create_mock_device(0, 0x1234, 0x5678)];
        let mut out = Vec::new();
        print_devices(&devices, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "----- HID Devices -----\n0: VID 0x1234\tPID 0x5678\n"
        );
    }

    #[test]
    fn test_hex_ids_are_not_padded() {
        let devices = [create_mock_device(0, 0x04f9, 0x0042)];
        let mut out = Vec::new();
        print_devices(&devices, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("0: VID 0x4f9\tPID 0x42"));
    }

    #[test]
    fn test_select_first_valid_index() {
        let devices = [create_mock_device(0, 0x1234, 0x5678)];
        let mut operator = ScriptedOperator::new(["0"]);
        let mut out = Vec::new();

        let selection = select_device(&devices, &mut operator, &mut out).unwrap();
        assert_eq!(
            selection,
            Selection::Selected(DeviceIds {
                vendor_id: 0x1234,
                product_id: 0x5678
            })
        );
        assert_eq!(operator.prompts(), ["Select device (0-0): "]);
    }

    #[test]
    fn test_reprompts_until_valid() {
        let devices = create_mock_device_list(3);
        let mut operator = ScriptedOperator::new(["", "abc", "-1", "3", "1.5", " 2 ", "0"]);
        let mut out = Vec::new();

        let selection = select_device(&devices, &mut operator, &mut out).unwrap();
        assert_eq!(selection, Selection::Selected(devices[2].ids()));
        assert_eq!(operator.prompts().len(), 6);
        assert!(operator.prompts().iter().all(|p| p == "Select device (0-2): "));
        assert_eq!(operator.remaining(), 1);
    }

    #[test]
    fn test_cancel_during_selection() {
        let devices = create_mock_device_list(2);
        let mut operator = ScriptedOperator::new(["9"]).then_cancel();
        let mut out = Vec::new();

        let selection = select_device(&devices, &mut operator, &mut out).unwrap();
        assert_eq!(selection, Selection::Cancelled);
        assert_eq!(operator.prompts().len(), 2);
    }
}
