//! Link error types

use thiserror::Error;

/// Errors that can occur on the serial link
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge rejected report (ACK 0x15)")]
    Nak,

    #[error("Unexpected ACK byte: 0x{0:02X}")]
    UnexpectedAck(u8),

    #[error("Timed out waiting for ACK")]
    Timeout,
}
