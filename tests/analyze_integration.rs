//! Integration tests for the capture analysis pipeline.
//!
//! These build a minimal legacy pcap file on disk and run the full
//! extract → decode → record path over it, exercising the boundary
//! between the reader loop, the frame layouts and the report codec.

use std::fs;
use std::path::PathBuf;

use ch9329_driver::pcap_analyzer::{CaptureAnalyzer, DeviceClass, OutputFormat, URB_VENDOR};

/// Little-endian legacy pcap global header.
fn pcap_header() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xA1B2_C3D4u32.to_le_bytes()); // magic
    bytes.extend_from_slice(&2u16.to_le_bytes()); // version major
    bytes.extend_from_slice(&4u16.to_le_bytes()); // version minor
    bytes.extend_from_slice(&0i32.to_le_bytes()); // thiszone
    bytes.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
    bytes.extend_from_slice(&65535u32.to_le_bytes()); // snaplen
    bytes.extend_from_slice(&220u32.to_le_bytes()); // linktype (USB)
    bytes
}

fn pcap_record(ts_sec: u32, ts_usec: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&ts_sec.to_le_bytes());
    bytes.extend_from_slice(&ts_usec.to_le_bytes());
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

/// A frame in the vendor URB wrapper: 20 bytes of header with the
/// endpoint byte at offset 15, payload after.
fn vendor_frame(endpoint_byte: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 20];
    frame[15] = endpoint_byte;
    frame.extend_from_slice(payload);
    frame
}

fn write_capture(name: &str, frames: &[Vec<u8>]) -> PathBuf {
    let mut bytes = pcap_header();
    for (i, frame) in frames.iter().enumerate() {
        bytes.extend_from_slice(&pcap_record(100 + i as u32, 0, frame));
    }
    let path = std::env::temp_dir().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn keyboard_and_mouse_frames_decode_in_order() {
    let frames = vec![
        // W pressed on endpoint 1
        vendor_frame(0x81, &[0x00, 0x00, 0x1A, 0, 0, 0, 0, 0]),
        // left+right chord moving left by 30 on endpoint 2
        vendor_frame(0x82, &[0x03, 0xE2, 0x00, 0x00, 0x00]),
        // runt frame, skipped
        vec![0xAA; 5],
    ];
    let path = write_capture("ch9329_analyze_basic.pcap", &frames);

    let analyzer = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR);
    let events = analyzer.analyze_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(events.len(), 2);

    assert_eq!(events[0].device, DeviceClass::Keyboard);
    assert_eq!(events[0].endpoint, 0x01);
    assert_eq!(events[0].timestamp, 0.0);
    assert_eq!(events[0].kind, "KEY_PRESS");
    assert!(events[0].details.contains('W'), "{}", events[0].details);

    assert_eq!(events[1].device, DeviceClass::Mouse);
    assert_eq!(events[1].endpoint, 0x02);
    assert_eq!(events[1].timestamp, 1.0);
    assert!(events[1].details.contains("left down"), "{}", events[1].details);
    assert!(events[1].details.contains("right down"), "{}", events[1].details);
    assert!(events[1].details.contains("dx=-30"), "{}", events[1].details);
}

#[test]
fn idle_frames_are_suppressed_by_default() {
    let frames = vec![
        vendor_frame(0x81, &[0u8; 8]),
        vendor_frame(0x81, &[0x00, 0x00, 0x04, 0, 0, 0, 0, 0]),
    ];
    let path = write_capture("ch9329_analyze_idle.pcap", &frames);

    let events = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR)
        .analyze_file(&path)
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].details, "keys: A (modifier 0x00)");

    let with_idle = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR)
        .with_idle(true)
        .analyze_file(&path)
        .unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(with_idle.len(), 2);
    assert_eq!(with_idle[0].kind, "IDLE");
}

#[test]
fn endpoint_filter_is_optional_configuration() {
    let frames = vec![
        vendor_frame(0x81, &[0x00, 0x00, 0x04, 0, 0, 0, 0, 0]),
        vendor_frame(0x82, &[0x01, 0x05, 0x00, 0x00, 0x00]),
    ];
    let path = write_capture("ch9329_analyze_endpoint.pcap", &frames);

    let all = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR)
        .analyze_file(&path)
        .unwrap();
    assert_eq!(all.len(), 2);

    let only_two = CaptureAnalyzer::new(OutputFormat::Text, URB_VENDOR)
        .with_endpoint(Some(0x02))
        .analyze_file(&path)
        .unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(only_two.len(), 1);
    assert_eq!(only_two[0].device, DeviceClass::Mouse);
}
