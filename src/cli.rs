// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ch9329_driver::report::MouseButton;

#[derive(Parser)]
#[command(name = "ch9329_driver")]
#[command(author, version, about = "Serial driver and capture analyzer for CH9329 USB HID bridges")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Serial port the bridge is attached to
    #[arg(long, global = true, default_value = "/dev/ttyUSB0", value_name = "PORT")]
    pub port: String,

    /// Baud rate for the serial link
    #[arg(long, global = true, default_value_t = 115_200)]
    pub baud: u32,

    /// Read timeout for the bridge acknowledgement, in milliseconds
    #[arg(long, global = true, default_value_t = 100)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Press a key (the report stays latched until a release)
    #[command(visible_alias = "p")]
    Press {
        /// Key name (see `keys` for the supported set)
        key: String,
    },

    /// Release a key (emits the all-released report)
    #[command(visible_alias = "r")]
    Release {
        /// Key name, validated against the table like `press`
        key: String,
    },

    /// Press a key, hold it, release it
    #[command(visible_alias = "t")]
    Tap {
        /// Key name
        key: String,
        /// Hold duration in milliseconds
        #[arg(long, default_value_t = 50)]
        hold_ms: u64,
    },

    /// Move the mouse by a relative offset (clamped to ±127 per report)
    #[command(visible_alias = "m")]
    Move {
        /// Horizontal offset, positive is right
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        /// Vertical offset, positive is down
        #[arg(allow_negative_numbers = true)]
        dy: i32,
    },

    /// Click a mouse button (press, gap, release)
    #[command(visible_alias = "c")]
    Click {
        /// left, right or middle
        button: MouseButton,
        /// Gap between press and release, in milliseconds
        #[arg(long, default_value_t = 50)]
        gap_ms: u64,
    },

    /// Execute a JSON instruction file (timed keyboard + mouse batch)
    Run {
        /// Instruction file path
        file: PathBuf,
        /// Stop at the first failed action instead of tallying
        #[arg(long)]
        fail_fast: bool,
        /// Gap between click press and release, in milliseconds
        #[arg(long, default_value_t = 50)]
        gap_ms: u64,
    },

    /// Decode keyboard/mouse events from a USB capture file
    #[command(visible_alias = "an")]
    Analyze {
        /// pcap/pcapng capture file
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = AnalyzeFormat::Text)]
        format: AnalyzeFormat,
        /// Capture wrapper variant the frame offsets are tuned for
        #[arg(long, value_enum, default_value_t = CaptureLayout::UrbVendor)]
        layout: CaptureLayout,
        /// Only decode frames on this endpoint (e.g. 0x02)
        #[arg(long)]
        endpoint: Option<String>,
        /// Also export the decoded events as a CSV table
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include idle (all-released) reports in the output
        #[arg(long)]
        idle: bool,
        /// Print the frame statistics breakdown after the scan
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the key names the outbound table accepts
    Keys,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum AnalyzeFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output (one object per line)
    Json,
    /// CSV rows with a header line
    Csv,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum CaptureLayout {
    /// Vendor/usbmon-style URB wrapper (endpoint at byte 15, payload at 20)
    #[default]
    UrbVendor,
    /// USBPcap header (27 bytes, endpoint at byte 21)
    Usbpcap,
}
