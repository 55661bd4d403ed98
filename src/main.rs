//! CH9329 Bridge Driver CLI
//!
//! Encodes keyboard/mouse intents into HID reports for a serial-attached
//! CH9329 bridge, and decodes captured USB traffic back into events.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

// CLI definitions
mod cli;
use cli::{AnalyzeFormat, CaptureLayout, Cli, Commands};

use ch9329_driver::instruction::{Instruction, Sequencer};
use ch9329_driver::pcap_analyzer::{self, CaptureAnalyzer, OutputFormat};
use ch9329_driver::{report, scancode};
use ch9329_link::{Link, LinkConfig, SerialLink};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = LinkConfig {
        port: cli.port.clone(),
        baud: cli.baud,
        timeout: Duration::from_millis(cli.timeout_ms),
    };

    match cli.command {
        Commands::Press { key } => {
            let rep = report::key_report(&key, true)?;
            open_link(&config)?.send_report(rep.as_bytes())?;
        }

        Commands::Release { key } => {
            let rep = report::key_report(&key, false)?;
            open_link(&config)?.send_report(rep.as_bytes())?;
        }

        Commands::Tap { key, hold_ms } => {
            let press = report::key_report(&key, true)?;
            let release = report::key_report(&key, false)?;
            let mut link = open_link(&config)?;
            link.send_report(press.as_bytes())?;
            thread::sleep(Duration::from_millis(hold_ms));
            link.send_report(release.as_bytes())?;
        }

        Commands::Move { dx, dy } => {
            open_link(&config)?.send_report(report::mouse_move(dx, dy).as_bytes())?;
        }

        Commands::Click { button, gap_ms } => {
            let mut link = open_link(&config)?;
            link.send_report(report::mouse_button(button, true).as_bytes())?;
            thread::sleep(Duration::from_millis(gap_ms));
            link.send_report(report::mouse_button(button, false).as_bytes())?;
        }

        Commands::Run {
            file,
            fail_fast,
            gap_ms,
        } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let instruction: Instruction = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;

            let cancel = Arc::new(AtomicBool::new(false));
            let handler_flag = cancel.clone();
            ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))
                .context("installing Ctrl-C handler")?;

            let mut link = open_link(&config)?;
            let summary = Sequencer::new(&mut link)
                .with_click_gap(Duration::from_millis(gap_ms))
                .with_fail_fast(fail_fast)
                .with_cancel(cancel)
                .run(&instruction);

            println!(
                "{} sent, {} failed{}",
                summary.sent,
                summary.failed,
                if summary.cancelled { ", cancelled" } else { "" }
            );
            if fail_fast && summary.failed > 0 {
                anyhow::bail!("action failed");
            }
        }

        Commands::Analyze {
            file,
            format,
            layout,
            endpoint,
            output,
            idle,
            verbose,
        } => {
            let format = match format {
                AnalyzeFormat::Text => OutputFormat::Text,
                AnalyzeFormat::Json => OutputFormat::Json,
                AnalyzeFormat::Csv => OutputFormat::Csv,
            };
            let layout = match layout {
                CaptureLayout::UrbVendor => pcap_analyzer::URB_VENDOR,
                CaptureLayout::Usbpcap => pcap_analyzer::USBPCAP,
            };
            let endpoint = endpoint.as_deref().map(parse_endpoint).transpose()?;

            let analyzer = CaptureAnalyzer::new(format, layout)
                .with_endpoint(endpoint)
                .with_idle(idle)
                .with_verbose(verbose);
            let events = analyzer
                .analyze_file(&file)
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            if let Some(path) = output {
                pcap_analyzer::write_csv(&path, &events)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), events = events.len(), "CSV exported");
            }
        }

        Commands::Keys => {
            for name in scancode::OUTBOUND_NAMES {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn open_link(config: &LinkConfig) -> anyhow::Result<SerialLink> {
    SerialLink::open(config).context("opening serial link")
}

/// Accept `0x02` hex or plain decimal endpoint numbers.
fn parse_endpoint(s: &str) -> anyhow::Result<u8> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).with_context(|| format!("invalid endpoint: {s}"))
    } else {
        s.parse::<u8>().with_context(|| format!("invalid endpoint: {s}"))
    }
}
