// CH9329 HID Bridge Driver - Shared Library
// Report codec, scan-code tables, instruction sequencing, capture analysis

pub mod instruction;
pub mod pcap_analyzer;
pub mod report;
pub mod scancode;

pub use instruction::{Instruction, RunSummary, Sequencer};
pub use report::{
    decode, key_report, mouse_button, mouse_move, EncodeError, HidInput, KeyboardReport,
    MouseButton, MouseReport,
};
