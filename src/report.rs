//! HID report construction and decoding.
//!
//! Report layouts follow the boot-protocol convention the CH9329 expects:
//!
//! ```text
//! keyboard (8 bytes): [modifiers, 0, k1, k2, k3, k4, k5, k6]
//! mouse    (5 bytes): [buttons, dx, dy, wheel, 0]
//! ```
//!
//! Each report is one complete snapshot of device state; the bridge holds
//! it until the next report arrives.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::scancode;

/// Keyboard report length on the wire.
pub const KEYBOARD_REPORT_LEN: usize = 8;
/// Mouse report length on the wire.
pub const MOUSE_REPORT_LEN: usize = 5;

/// Largest delta a mouse report can carry. ±127 rather than the full i8
/// range so the -128 two's-complement edge never reaches the wire.
pub const MAX_DELTA: i8 = 127;

/// Encode-time failures. Local to one action — a batch run tallies these
/// instead of aborting.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unknown key: \"{0}\"")]
    UnknownKey(String),
}

/// One keyboard state snapshot.
///
/// [`key_report`] only ever populates scan slot `k1`: the encode surface
/// takes one key per report, so chords of non-modifier keys are not
/// expressible outbound. All six slots are read on the inbound path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardReport([u8; KEYBOARD_REPORT_LEN]);

impl KeyboardReport {
    /// The all-released report.
    pub const RELEASE_ALL: Self = Self([0; KEYBOARD_REPORT_LEN]);

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One mouse state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport([u8; MOUSE_REPORT_LEN]);

impl MouseReport {
    /// The no-buttons, no-motion report.
    pub const RELEASE_ALL: Self = Self([0; MOUSE_REPORT_LEN]);

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Mouse buttons, one disjoint mask bit each within the report's button
/// byte. Masks compose on decode; the encode surface sets one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn mask(self) -> u8 {
        match self {
            Self::Left => 0x01,
            Self::Right => 0x02,
            Self::Middle => 0x04,
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" => Ok(Self::Middle),
            _ => Err(format!("unknown mouse button: \"{s}\"")),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Middle => write!(f, "middle"),
        }
    }
}

/// Build a keyboard report for one key going down or up.
///
/// Modifier identifiers set their bit in the modifier byte; regular keys
/// land in scan slot `k1`. A release yields the all-zero report — the
/// whole snapshot is cleared, matching how the bridge tracks state.
pub fn key_report(key: &str, pressed: bool) -> Result<KeyboardReport, EncodeError> {
    let code =
        scancode::code_from_name(key).ok_or_else(|| EncodeError::UnknownKey(key.to_string()))?;

    let mut bytes = [0u8; KEYBOARD_REPORT_LEN];
    if pressed {
        match scancode::modifier_bit(code) {
            Some(bit) => bytes[0] = bit,
            None => bytes[2] = code,
        }
    }
    Ok(KeyboardReport(bytes))
}

/// Build a relative mouse movement report. Total: deltas outside ±127 are
/// clamped, never wrapped.
pub fn mouse_move(dx: i32, dy: i32) -> MouseReport {
    let mut bytes = [0u8; MOUSE_REPORT_LEN];
    bytes[1] = clamp_delta(dx) as u8;
    bytes[2] = clamp_delta(dy) as u8;
    MouseReport(bytes)
}

/// Build a button report. Press sets exactly that button's bit; release
/// clears the whole mask regardless of which button was named, so a
/// release is always safe to send no matter what state preceded it.
pub fn mouse_button(button: MouseButton, pressed: bool) -> MouseReport {
    let mut bytes = [0u8; MOUSE_REPORT_LEN];
    if pressed {
        bytes[0] = button.mask();
    }
    MouseReport(bytes)
}

fn clamp_delta(v: i32) -> i8 {
    v.clamp(-(MAX_DELTA as i32), MAX_DELTA as i32) as i8
}

/// A decoded inbound HID payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidInput {
    Keyboard(KeyboardInput),
    Mouse(MouseInput),
}

/// Fields of an inbound keyboard report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardInput {
    /// Modifier byte (see [`scancode::mods`]).
    pub modifier: u8,
    /// Non-zero scan codes from slots k1..k6, in slot order.
    pub keys: Vec<u8>,
}

impl KeyboardInput {
    /// All released. Still a valid report — whether to show it is the
    /// sink's policy.
    pub fn is_idle(&self) -> bool {
        self.modifier == 0 && self.keys.is_empty()
    }
}

/// Fields of an inbound mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    pub buttons: u8,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

impl MouseInput {
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.dx == 0 && self.dy == 0 && self.wheel == 0
    }

    pub fn pressed(&self, button: MouseButton) -> bool {
        self.buttons & button.mask() != 0
    }
}

/// Classify a payload by length and pull its fields out.
///
/// Exactly 8 bytes is a keyboard report; 5 or 6 bytes a mouse report
/// (some mice append a pan byte — the leading layout is the same).
/// Anything else is not a shape this decoder knows: `None`, not an error.
pub fn decode(payload: &[u8]) -> Option<HidInput> {
    match payload.len() {
        KEYBOARD_REPORT_LEN => Some(HidInput::Keyboard(KeyboardInput {
            modifier: payload[0],
            keys: payload[2..8].iter().copied().filter(|&c| c != 0).collect(),
        })),
        5 | 6 => Some(HidInput::Mouse(MouseInput {
            buttons: payload[0],
            dx: payload[1] as i8,
            dy: payload[2] as i8,
            wheel: payload[3] as i8,
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scancode::mods;

    #[test]
    fn key_press_wire_bytes() {
        let report = key_report("W", true).unwrap();
        assert_eq!(report.as_bytes(), [0x00, 0x00, 0x1A, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn key_release_is_all_zero() {
        let report = key_report("W", false).unwrap();
        assert_eq!(report, KeyboardReport::RELEASE_ALL);
    }

    #[test]
    fn modifier_goes_through_modifier_byte() {
        let report = key_report("LEFTCTRL", true).unwrap();
        assert_eq!(report.as_bytes(), [mods::LCTRL, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            key_report("NotAKey", true),
            Err(EncodeError::UnknownKey(_))
        ));
        // Release of an unknown key is rejected too, not silently zeroed.
        assert!(key_report("NotAKey", false).is_err());
    }

    #[test]
    fn move_clamps_not_wraps() {
        assert_eq!(mouse_move(200, -500).as_bytes()[1] as i8, 127);
        assert_eq!(mouse_move(200, -500).as_bytes()[2] as i8, -127);
        assert_eq!(mouse_move(-127, 127).as_bytes()[1] as i8, -127);
    }

    #[test]
    fn move_sign_round_trip() {
        let report = mouse_move(-30, 0);
        let Some(HidInput::Mouse(m)) = decode(report.as_bytes()) else {
            panic!("expected mouse input");
        };
        assert_eq!((m.dx, m.dy), (-30, 0));
    }

    #[test]
    fn move_round_trip_across_range() {
        for v in [-127i32, -64, -1, 0, 1, 64, 127] {
            let Some(HidInput::Mouse(m)) = decode(mouse_move(v, -v).as_bytes()) else {
                panic!("expected mouse input");
            };
            assert_eq!((m.dx as i32, m.dy as i32), (v, -v));
        }
    }

    #[test]
    fn button_release_always_zero_mask() {
        for button in [MouseButton::Left, MouseButton::Right, MouseButton::Middle] {
            assert_eq!(mouse_button(button, false), MouseReport::RELEASE_ALL);
        }
    }

    #[test]
    fn button_masks_disjoint() {
        assert_eq!(mouse_button(MouseButton::Left, true).as_bytes()[0], 0x01);
        assert_eq!(mouse_button(MouseButton::Right, true).as_bytes()[0], 0x02);
        assert_eq!(mouse_button(MouseButton::Middle, true).as_bytes()[0], 0x04);
    }

    #[test]
    fn decode_idle_keyboard() {
        let Some(HidInput::Keyboard(kb)) = decode(&[0u8; 8]) else {
            panic!("expected keyboard input");
        };
        assert!(kb.is_idle());
        assert!(kb.keys.is_empty());
    }

    #[test]
    fn decode_left_right_chord() {
        let Some(HidInput::Mouse(m)) = decode(&[0x03, 0, 0, 0, 0]) else {
            panic!("expected mouse input");
        };
        assert!(m.pressed(MouseButton::Left));
        assert!(m.pressed(MouseButton::Right));
        assert!(!m.pressed(MouseButton::Middle));
        assert_eq!((m.dx, m.dy, m.wheel), (0, 0, 0));
    }

    #[test]
    fn decode_six_byte_mouse() {
        let Some(HidInput::Mouse(m)) = decode(&[0x01, 0xFF, 0x05, 0x01, 0, 0]) else {
            panic!("expected mouse input");
        };
        assert_eq!((m.dx, m.dy, m.wheel), (-1, 5, 1));
    }

    #[test]
    fn decode_rejects_other_shapes() {
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[0u8; 4]), None);
        assert_eq!(decode(&[0u8; 7]), None);
        assert_eq!(decode(&[0u8; 9]), None);
    }

    #[test]
    fn curated_table_round_trip() {
        use crate::scancode;

        for name in scancode::OUTBOUND_NAMES {
            let code = scancode::code_from_name(name).unwrap();
            let report = key_report(name, true).unwrap();
            let Some(HidInput::Keyboard(kb)) = decode(report.as_bytes()) else {
                panic!("expected keyboard input for {name}");
            };
            match scancode::modifier_bit(code) {
                Some(bit) => {
                    assert_eq!(kb.modifier, bit, "{name}");
                    assert!(kb.keys.is_empty(), "{name}");
                }
                None => {
                    assert_eq!(kb.modifier, 0, "{name}");
                    assert_eq!(kb.keys, vec![code], "{name}");
                }
            }
        }
    }
}
