//! Output formatting for decoded capture events.
//!
//! Text goes to people watching a scan, JSON lines to scripts, CSV to the
//! table export the capture workflow ends with.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::report::{HidInput, KeyboardInput, MouseButton, MouseInput};
use crate::scancode;

/// Output format for the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Device class of a decoded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceClass {
    Keyboard,
    Mouse,
}

impl DeviceClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Keyboard => "KEYBOARD",
            Self::Mouse => "MOUSE",
        }
    }
}

/// One decoded input event, ready for any of the output formats.
/// Immutable once built; the analyzer appends these in frame order.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEvent {
    /// Seconds since the first frame in the capture.
    pub timestamp: f64,
    /// USB endpoint the report was captured on.
    pub endpoint: u8,
    pub device: DeviceClass,
    /// Event kind column (KEY_PRESS, EVENT, IDLE).
    pub kind: &'static str,
    /// Human-readable description of the report contents.
    pub details: String,
}

impl DecodedEvent {
    /// Render a decoded payload into an output record.
    pub fn from_input(timestamp: f64, endpoint: u8, input: &HidInput) -> Self {
        match input {
            HidInput::Keyboard(kb) => Self {
                timestamp,
                endpoint,
                device: DeviceClass::Keyboard,
                kind: if kb.is_idle() { "IDLE" } else { "KEY_PRESS" },
                details: describe_keyboard(kb),
            },
            HidInput::Mouse(m) => Self {
                timestamp,
                endpoint,
                device: DeviceClass::Mouse,
                kind: if m.is_idle() { "IDLE" } else { "EVENT" },
                details: describe_mouse(m),
            },
        }
    }

    pub fn is_idle(&self) -> bool {
        self.kind == "IDLE"
    }
}

fn describe_keyboard(kb: &KeyboardInput) -> String {
    if kb.is_idle() {
        return "all released".into();
    }
    let keys: Vec<String> = kb.keys.iter().map(|&c| key_label(c)).collect();
    if keys.is_empty() {
        format!("modifier 0x{:02X}", kb.modifier)
    } else {
        format!("keys: {} (modifier 0x{:02X})", keys.join(", "), kb.modifier)
    }
}

/// Inbound rendering is permissive: codes outside the curated table come
/// out as a labeled placeholder instead of failing the event.
fn key_label(code: u8) -> String {
    match scancode::key_name(code) {
        Some(name) => name.to_string(),
        None => format!("Unknown(0x{code:02X})"),
    }
}

fn describe_mouse(m: &MouseInput) -> String {
    if m.is_idle() {
        return "all released".into();
    }
    let mut parts = Vec::new();
    if m.pressed(MouseButton::Left) {
        parts.push("left down".to_string());
    }
    if m.pressed(MouseButton::Right) {
        parts.push("right down".to_string());
    }
    if m.pressed(MouseButton::Middle) {
        parts.push("middle down".to_string());
    }
    if m.dx != 0 || m.dy != 0 {
        parts.push(format!("move (dx={}, dy={})", m.dx, m.dy));
    }
    if m.wheel != 0 {
        let direction = if m.wheel > 0 { "up" } else { "down" };
        parts.push(format!("wheel {} {}", direction, m.wheel.unsigned_abs()));
    }
    parts.join("; ")
}

/// Header row for the CSV table.
pub const CSV_HEADER: &str = "Timestamp,Endpoint,Device_Type,Event_Type,Details";

/// Format one event as a CSV row. Details may contain commas, so that
/// field is quoted.
fn csv_line(event: &DecodedEvent) -> String {
    format!(
        "{:.6},0x{:02x},{},{},\"{}\"",
        event.timestamp,
        event.endpoint,
        event.device.label(),
        event.kind,
        event.details.replace('"', "\"\"")
    )
}

/// Write the whole event list as a CSV table (the `--output` export).
pub fn write_csv(path: &Path, events: &[DecodedEvent]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{CSV_HEADER}")?;
    for event in events {
        writeln!(file, "{}", csv_line(event))?;
    }
    Ok(())
}

/// Output printer.
///
/// Idle suppression lives here: idle reports decode fine, but most of the
/// time nobody wants to see them, so hiding them is a policy of this sink
/// rather than of the codec.
pub struct Printer {
    format: OutputFormat,
    show_idle: bool,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_idle: false,
        }
    }

    /// Include idle (all-released) reports in the output.
    pub fn with_idle(mut self, show_idle: bool) -> Self {
        self.show_idle = show_idle;
        self
    }

    /// Whether this event should reach the output at all.
    pub fn wants(&self, event: &DecodedEvent) -> bool {
        self.show_idle || !event.is_idle()
    }

    /// Print the column header, for formats that have one.
    pub fn print_header(&self) {
        if self.format == OutputFormat::Csv {
            println!("{CSV_HEADER}");
        }
    }

    pub fn print_event(&self, event: &DecodedEvent) {
        match self.format {
            OutputFormat::Text => println!(
                "{:.6} EP{:02x} {} {} {}",
                event.timestamp,
                event.endpoint,
                event.device.label(),
                event.kind,
                event.details
            ),
            OutputFormat::Json => println!("{}", serde_json::to_string(event).unwrap()),
            OutputFormat::Csv => println!("{}", csv_line(event)),
        }
    }
}
