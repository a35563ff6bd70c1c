//! Hex frame integration tests
//!
//! Property tests for the operator hex codec:
//! - Valid even-length text parses and re-formats to its canonical form
//! - Odd-length or non-hex text is always rejected
//! - Scripted operators cancel once their lines run out
//!
//! Run with: `cargo test -p common --test frame_tests`

use common::test_utils::ScriptedOperator;
use common::{ByteFrame, FrameError, Operator, Prompted};
use proptest::prelude::*;

/// Lower-case, space-free, two digits per byte, a space after each byte
fn canonical(text: &str) -> String {
    let digits: Vec<char> = text
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    digits
        .chunks(2)
        .map(|pair| format!("{}{} ", pair[0], pair[1]))
        .collect()
}

proptest! {
    #[test]
    fn prop_valid_hex_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..64), upper in any::<bool>()) {
        let text: String = bytes
            .iter()
            .map(|b| if upper { format!("{:02X}", b) } else { format!("{:02x}", b) })
            .collect();

        let frame = ByteFrame::from_hex(&text).unwrap();
        prop_assert_eq!(frame.as_bytes(), bytes.as_slice());
        prop_assert_eq!(frame.to_hex(), canonical(&text));
    }

    #[test]
    fn prop_spaces_are_ignored(text in "([0-9a-fA-F]{2}){0,16}", gaps in prop::collection::vec(0usize..3, 0..32)) {
        let mut spaced = String::new();
        for (i, c) in text.chars().enumerate() {
            let n = gaps.get(i).copied().unwrap_or(0);
            spaced.push_str(&" ".repeat(n));
            spaced.push(c);
        }

        let plain = ByteFrame::from_hex(&text).unwrap();
        let with_spaces = ByteFrame::from_hex(&spaced).unwrap();
        prop_assert_eq!(plain, with_spaces);
    }

    #[test]
    fn prop_odd_length_rejected(text in "[0-9a-f]{1,31}") {
        prop_assume!(text.len() % 2 == 1);
        prop_assert_eq!(
            ByteFrame::from_hex(&text),
            Err(FrameError::OddLength { len: text.len() })
        );
    }

    #[test]
    fn prop_non_hex_rejected(prefix in "([0-9a-f]{2}){0,4}", bad in "[g-zG-Z!#%]") {
        let text = format!("{}{}0", prefix, bad);
        prop_assert!(ByteFrame::from_hex(&text).is_err());
    }
}

#[test]
fn test_scripted_operator_cancels_when_exhausted() {
    let mut operator = ScriptedOperator::new(["a"]);
    assert_eq!(operator.prompt("> ").unwrap(), Prompted::Line("a".to_string()));
    assert_eq!(operator.prompt("> ").unwrap(), Prompted::Cancelled);
    assert_eq!(operator.prompts(), ["> ", "> "]);
}
