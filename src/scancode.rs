//! HID keyboard usage tables and modifier classification.
//!
//! Two directions with deliberately different coverage: the outbound table
//! ([`code_from_name`]) is the curated set of keys the bridge can be asked
//! to press, while the inbound table ([`key_name`]) covers the standard
//! keyboard usage page so captured traffic stays readable. Codes outside
//! the inbound table decode to `None` and are rendered as a placeholder by
//! the caller, never dropped.

/// HID modifier bitmask constants (USB HID Report Descriptor modifier byte).
///
/// These match the bit positions in the first byte of a standard HID
/// keyboard report, where each bit corresponds to a modifier key
/// (usage 0xE0-0xE7).
pub mod mods {
    pub const LCTRL: u8 = 0x01;
    pub const LSHIFT: u8 = 0x02;
    pub const LALT: u8 = 0x04;
    pub const LGUI: u8 = 0x08;
    pub const RCTRL: u8 = 0x10;
    pub const RSHIFT: u8 = 0x20;
    pub const RALT: u8 = 0x40;
    pub const RGUI: u8 = 0x80;
}

/// Modifier-byte bit for a modifier usage code (0xE0-0xE7).
///
/// This classification is a fixed property of the table: whether a key is
/// encoded through the modifier byte or through a scan-code slot is
/// decided here, not by callers.
pub fn modifier_bit(code: u8) -> Option<u8> {
    match code {
        0xE0..=0xE7 => Some(1 << (code - 0xE0)),
        _ => None,
    }
}

/// Resolve a key name from the curated outbound table.
///
/// Case-insensitive; modifier keys are accepted under their common
/// aliases. `None` for anything outside the table — callers reject the
/// action rather than encoding a zero scan code.
pub fn code_from_name(name: &str) -> Option<u8> {
    let name = name.trim();

    // Letters and digits map arithmetically onto the usage page.
    if name.len() == 1 {
        let ch = name.chars().next()?;
        match ch {
            'a'..='z' => return Some(0x04 + (ch as u8 - b'a')),
            'A'..='Z' => return Some(0x04 + (ch as u8 - b'A')),
            '1'..='9' => return Some(0x1E + (ch as u8 - b'1')),
            '0' => return Some(0x27),
            _ => {}
        }
    }

    match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => Some(0x28),
        "escape" | "esc" => Some(0x29),
        "backspace" => Some(0x2A),
        "tab" => Some(0x2B),
        "space" => Some(0x2C),
        "-" => Some(0x2D),
        "=" => Some(0x2E),
        "[" => Some(0x2F),
        "]" => Some(0x30),
        "\\" => Some(0x31),
        ";" => Some(0x33),
        "'" => Some(0x34),
        "`" => Some(0x35),
        "," => Some(0x36),
        "." => Some(0x37),
        "/" => Some(0x38),
        "capslock" => Some(0x39),
        "f1" => Some(0x3A),
        "f2" => Some(0x3B),
        "f3" => Some(0x3C),
        "f4" => Some(0x3D),
        "f5" => Some(0x3E),
        "f6" => Some(0x3F),
        "f7" => Some(0x40),
        "f8" => Some(0x41),
        "f9" => Some(0x42),
        "f10" => Some(0x43),
        "f11" => Some(0x44),
        "f12" => Some(0x45),
        "printscreen" => Some(0x46),
        "scrolllock" => Some(0x47),
        "pause" => Some(0x48),
        "insert" => Some(0x49),
        "home" => Some(0x4A),
        "pageup" => Some(0x4B),
        "delete" | "del" => Some(0x4C),
        "end" => Some(0x4D),
        "pagedown" => Some(0x4E),
        "right" => Some(0x4F),
        "left" => Some(0x50),
        "down" => Some(0x51),
        "up" => Some(0x52),
        "ctrl" | "control" | "lctrl" | "leftctrl" => Some(0xE0),
        "shift" | "lshift" | "leftshift" => Some(0xE1),
        "alt" | "lalt" | "leftalt" | "option" => Some(0xE2),
        "gui" | "win" | "super" | "cmd" | "lgui" | "leftgui" => Some(0xE3),
        "rctrl" | "rightctrl" => Some(0xE4),
        "rshift" | "rightshift" => Some(0xE5),
        "ralt" | "rightalt" | "altgr" => Some(0xE6),
        "rgui" | "rwin" | "rightgui" => Some(0xE7),
        _ => None,
    }
}

/// Name of a HID keyboard usage code (USB HID Usage Tables, Section 10).
///
/// Full-coverage inbound direction; `None` for codes outside the keyboard
/// page subset below.
pub fn key_name(code: u8) -> Option<&'static str> {
    #[rustfmt::skip]
    let name = match code {
        0x04 => "A", 0x05 => "B", 0x06 => "C", 0x07 => "D",
        0x08 => "E", 0x09 => "F", 0x0A => "G", 0x0B => "H",
        0x0C => "I", 0x0D => "J", 0x0E => "K", 0x0F => "L",
        0x10 => "M", 0x11 => "N", 0x12 => "O", 0x13 => "P",
        0x14 => "Q", 0x15 => "R", 0x16 => "S", 0x17 => "T",
        0x18 => "U", 0x19 => "V", 0x1A => "W", 0x1B => "X",
        0x1C => "Y", 0x1D => "Z",
        0x1E => "1", 0x1F => "2", 0x20 => "3", 0x21 => "4",
        0x22 => "5", 0x23 => "6", 0x24 => "7", 0x25 => "8",
        0x26 => "9", 0x27 => "0",
        0x28 => "Enter", 0x29 => "Escape", 0x2A => "Backspace",
        0x2B => "Tab", 0x2C => "Space", 0x2D => "-", 0x2E => "=",
        0x2F => "[", 0x30 => "]", 0x31 => "\\", 0x32 => "#",
        0x33 => ";", 0x34 => "'", 0x35 => "`", 0x36 => ",",
        0x37 => ".", 0x38 => "/", 0x39 => "CapsLock",
        0x3A => "F1", 0x3B => "F2", 0x3C => "F3", 0x3D => "F4",
        0x3E => "F5", 0x3F => "F6", 0x40 => "F7", 0x41 => "F8",
        0x42 => "F9", 0x43 => "F10", 0x44 => "F11", 0x45 => "F12",
        0x46 => "PrintScr", 0x47 => "ScrollLock", 0x48 => "Pause",
        0x49 => "Insert", 0x4A => "Home", 0x4B => "PageUp",
        0x4C => "Delete", 0x4D => "End", 0x4E => "PageDown",
        0x4F => "Right", 0x50 => "Left", 0x51 => "Down", 0x52 => "Up",
        0x53 => "NumLock", 0x54 => "KP/", 0x55 => "KP*", 0x56 => "KP-",
        0x57 => "KP+", 0x58 => "KPEnter",
        0x59 => "KP1", 0x5A => "KP2", 0x5B => "KP3", 0x5C => "KP4",
        0x5D => "KP5", 0x5E => "KP6", 0x5F => "KP7", 0x60 => "KP8",
        0x61 => "KP9", 0x62 => "KP0", 0x63 => "KP.",
        0x64 => "NonUS\\", 0x65 => "App", 0x66 => "Power",
        0x67 => "KP=",
        0xE0 => "LCtrl", 0xE1 => "LShift", 0xE2 => "LAlt", 0xE3 => "LGUI",
        0xE4 => "RCtrl", 0xE5 => "RShift", 0xE6 => "RAlt", 0xE7 => "RGUI",
        _ => return None,
    };
    Some(name)
}

/// Canonical names the outbound table accepts, for `keys` listings.
/// Aliases (Esc, Return, Ctrl, Win, ...) resolve to the same codes.
#[rustfmt::skip]
pub const OUTBOUND_NAMES: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    "Enter", "Escape", "Backspace", "Tab", "Space",
    "-", "=", "[", "]", "\\", ";", "'", "`", ",", ".", "/",
    "CapsLock",
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    "PrintScreen", "ScrollLock", "Pause",
    "Insert", "Home", "PageUp", "Delete", "End", "PageDown",
    "Right", "Left", "Down", "Up",
    "LCtrl", "LShift", "LAlt", "LGui",
    "RCtrl", "RShift", "RAlt", "RGui",
];
