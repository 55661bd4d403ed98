//! Offline analysis of captured USB HID traffic.
//!
//! Reads pcap/pcapng captures of keyboard/mouse traffic, locates the HID
//! payload in each frame and decodes it back into readable input events.
//!
//! # Example
//!
//! ```ignore
//! use ch9329_driver::pcap_analyzer::{CaptureAnalyzer, OutputFormat, URB_VENDOR};
//!
//! let analyzer = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR);
//! let events = analyzer.analyze_file("capture.pcapng".as_ref())?;
//! ```

mod frame;
mod printer;

pub use frame::{FrameLayout, URB_VENDOR, USBPCAP};
pub use printer::{write_csv, DecodedEvent, DeviceClass, OutputFormat, Printer, CSV_HEADER};

use std::fs::File;
use std::path::Path;

use pcap_parser::pcapng::Block;
use pcap_parser::{create_reader, PcapBlockOwned, PcapError};
use tracing::debug;

use crate::report::{self, HidInput};

/// Shortest payload worth handing to the report decoder. Anything below
/// this is wrapper padding, not a HID report.
const MIN_PAYLOAD_LEN: usize = 4;

/// How often the running frame count goes to stderr.
const PROGRESS_INTERVAL: u64 = 1000;

/// Frame statistics for the end-of-scan summary
#[derive(Default)]
struct ScanStats {
    frames: u64,
    too_short: u64,
    short_payload: u64,
    unknown_shape: u64,
    filtered_endpoint: u64,
    keyboard: u64,
    mouse: u64,
    idle_suppressed: u64,
}

impl ScanStats {
    fn decoded(&self) -> u64 {
        self.keyboard + self.mouse
    }

    fn skipped(&self) -> u64 {
        self.too_short + self.short_payload + self.unknown_shape + self.filtered_endpoint
    }

    fn print_summary(&self) {
        eprintln!("\nFrame statistics:");
        eprintln!("  Frames read:        {}", self.frames);
        eprintln!("  Too short:          {}", self.too_short);
        eprintln!("  Payload too short:  {}", self.short_payload);
        eprintln!("  Unknown shape:      {}", self.unknown_shape);
        eprintln!("  Endpoint filtered:  {}", self.filtered_endpoint);
        eprintln!("  Keyboard reports:   {}", self.keyboard);
        eprintln!("  Mouse reports:      {}", self.mouse);
        eprintln!("  Idle suppressed:    {}", self.idle_suppressed);
    }
}

/// Capture analyzer: walks a pcap/pcapng file and prints decoded input
/// events as it finds them.
pub struct CaptureAnalyzer {
    printer: Printer,
    layout: FrameLayout,
    endpoint_filter: Option<u8>,
    verbose: bool,
}

impl CaptureAnalyzer {
    /// Create a new analyzer with the given output format and wrapper
    /// layout.
    pub fn new(format: OutputFormat, layout: FrameLayout) -> Self {
        Self {
            printer: Printer::new(format),
            layout,
            endpoint_filter: None,
            verbose: false,
        }
    }

    /// Only decode frames captured on this endpoint. Off by default —
    /// real captures use endpoints nobody anticipated.
    pub fn with_endpoint(mut self, endpoint: Option<u8>) -> Self {
        self.endpoint_filter = endpoint;
        self
    }

    /// Include idle (all-released) reports in the output.
    pub fn with_idle(mut self, idle: bool) -> Self {
        self.printer = self.printer.with_idle(idle);
        self
    }

    /// Print the frame statistics breakdown after the scan.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Scan a capture file, printing decoded events as they are found.
    /// Returns the printed events in frame order for optional export.
    pub fn analyze_file(&self, path: &Path) -> Result<Vec<DecodedEvent>, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        let mut reader = create_reader(65536, file)?;
        let mut base_timestamp: Option<u64> = None;
        let mut last_incomplete_index = 0u64;

        let mut stats = ScanStats::default();
        let mut events = Vec::new();

        self.printer.print_header();

        loop {
            // Extract what we need from the block before consume/refill to
            // avoid lifetime issues with borrowed data.
            let result = reader.next();

            match result {
                Ok((offset, block)) => {
                    let packet_info: Option<(u64, Vec<u8>)> = match &block {
                        // pcapng: EnhancedPacket timestamps are one 64-bit
                        // value split across ts_high/ts_low.
                        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                            let ts = ((epb.ts_high as u64) << 32) | epb.ts_low as u64;
                            Some((ts, epb.data.to_vec()))
                        }
                        // Legacy pcap: seconds + microseconds.
                        PcapBlockOwned::Legacy(lp) => {
                            let ts = lp.ts_sec as u64 * 1_000_000 + lp.ts_usec as u64;
                            Some((ts, lp.data.to_vec()))
                        }
                        // Skip other block types
                        _ => None,
                    };

                    reader.consume(offset);

                    if let Some((ts_raw, data)) = packet_info {
                        let ts = match base_timestamp {
                            Some(base) => ts_raw.saturating_sub(base) as f64 / 1_000_000.0,
                            None => {
                                base_timestamp = Some(ts_raw);
                                0.0
                            }
                        };

                        stats.frames += 1;
                        if stats.frames % PROGRESS_INTERVAL == 0 {
                            eprintln!(
                                "...{} frames read, {} decoded",
                                stats.frames,
                                stats.decoded()
                            );
                        }
                        self.process_frame(ts, &data, &mut stats, &mut events);
                    }
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete(_)) => {
                    // Need more data; guard against truncated files that
                    // would otherwise loop forever.
                    if last_incomplete_index == stats.frames {
                        eprintln!(
                            "Warning: could not read a complete block (file may be truncated)"
                        );
                        break;
                    }
                    last_incomplete_index = stats.frames;
                    reader
                        .refill()
                        .map_err(|e| format!("refill error: {:?}", e))?;
                    continue;
                }
                Err(e) => {
                    return Err(format!("capture parse error: {:?}", e).into());
                }
            }
        }

        eprintln!(
            "\n--- {} frames read, {} decoded, {} skipped ---",
            stats.frames,
            stats.decoded(),
            stats.skipped()
        );

        if self.verbose {
            stats.print_summary();
        }

        Ok(events)
    }

    /// Extract, filter and decode one frame.
    fn process_frame(
        &self,
        timestamp: f64,
        raw: &[u8],
        stats: &mut ScanStats,
        events: &mut Vec<DecodedEvent>,
    ) {
        let Some((endpoint, payload)) = self.layout.extract(raw) else {
            stats.too_short += 1;
            debug!(len = raw.len(), "frame below wrapper minimum, skipped");
            return;
        };

        if let Some(want) = self.endpoint_filter {
            if endpoint != want {
                stats.filtered_endpoint += 1;
                return;
            }
        }

        if payload.len() < MIN_PAYLOAD_LEN {
            stats.short_payload += 1;
            debug!(len = payload.len(), "payload too short for a HID report, skipped");
            return;
        }

        let Some(input) = report::decode(payload) else {
            stats.unknown_shape += 1;
            debug!(len = payload.len(), "payload length matches no known report shape");
            return;
        };

        match &input {
            HidInput::Keyboard(_) => stats.keyboard += 1,
            HidInput::Mouse(_) => stats.mouse += 1,
        }

        let event = DecodedEvent::from_input(timestamp, endpoint, &input);
        if self.printer.wants(&event) {
            self.printer.print_event(&event);
            events.push(event);
        } else {
            stats.idle_suppressed += 1;
        }
    }
}
