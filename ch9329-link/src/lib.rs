//! Serial link to CH9329 USB HID bridge adapters
//!
//! The CH9329 accepts raw HID report bytes over its UART and answers each
//! write with a single acknowledgement byte. This crate owns the port
//! configuration and the write/ACK exchange; report construction lives in
//! the driver crate.

pub mod error;

pub use error::LinkError;

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, trace};

/// ACK byte the bridge returns after accepting a report.
pub const ACK_OK: u8 = 0x06;
/// ACK byte the bridge returns on a protocol error.
pub const ACK_ERR: u8 = 0x15;

/// Serial port configuration for the bridge link.
///
/// The CH9329 ships at 115200 baud, 8 data bits, no parity, one stop bit.
/// Port and baud vary by deployment, so both are passed in rather than
/// baked in.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Port path (`/dev/ttyUSB0`, `COM3`, ...)
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// Read timeout for the ACK byte
    pub timeout: Duration,
}

impl LinkConfig {
    /// Config with the bridge's factory defaults for everything but the port.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: 115_200,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Anything that can carry a HID report to the bridge.
///
/// The sequencer and the CLI commands are written against this trait so
/// tests can substitute a recording mock for the physical port.
pub trait Link {
    /// Write one report verbatim and wait for the bridge's acknowledgement.
    fn send_report(&mut self, report: &[u8]) -> Result<(), LinkError>;
}

/// A serial connection to a CH9329 bridge.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
    /// Open the configured port.
    ///
    /// Failure here is fatal to the caller; everything after a successful
    /// open is recoverable per report.
    pub fn open(config: &LinkConfig) -> Result<Self, LinkError> {
        let port = serialport::new(&config.port, config.baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(config.timeout)
            .open()
            .map_err(|source| LinkError::Open {
                port: config.port.clone(),
                source,
            })?;
        debug!(port = %config.port, baud = config.baud, "serial link open");
        Ok(Self { port })
    }
}

impl Link for SerialLink {
    fn send_report(&mut self, report: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(report)?;
        self.port.flush()?;

        let mut ack = [0u8; 1];
        match self.port.read_exact(&mut ack) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                return Err(LinkError::Timeout);
            }
            Err(e) => return Err(LinkError::Io(e)),
        }

        trace!(ack = ack[0], "bridge ack");
        match ack[0] {
            ACK_OK => Ok(()),
            ACK_ERR => Err(LinkError::Nak),
            other => Err(LinkError::UnexpectedAck(other)),
        }
    }
}
