//! Locating HID payload inside captured link-layer frames.
//!
//! Capture wrappers put the endpoint and payload at fixed positions that
//! depend on the capture tool, not on anything this code can derive from
//! the frame itself. Each [`FrameLayout`] is therefore a named
//! constant-offset table for one wrapper variant. Feeding a capture
//! through the wrong layout silently produces garbage, which is why the
//! variant is selected by the operator rather than guessed.

/// Constant offsets for one capture wrapper variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Shortest frame this wrapper can produce. Anything shorter is not a
    /// parseable record and is skipped, never an error.
    pub min_len: usize,
    /// Offset of the byte carrying the endpoint number.
    pub endpoint_offset: usize,
    /// Mask applied to the endpoint byte (captures fold the direction bit
    /// into the high nibble).
    pub endpoint_mask: u8,
    /// Offset where the HID payload starts.
    pub payload_offset: usize,
}

/// Vendor/usbmon-style URB wrapper: endpoint in the low nibble of byte 15,
/// payload from byte 20.
pub const URB_VENDOR: FrameLayout = FrameLayout {
    min_len: 16,
    endpoint_offset: 15,
    endpoint_mask: 0x0F,
    payload_offset: 20,
};

/// USBPcap's fixed header: 27 bytes, endpoint at byte 21, payload
/// immediately after the header.
pub const USBPCAP: FrameLayout = FrameLayout {
    min_len: 27,
    endpoint_offset: 21,
    endpoint_mask: 0x0F,
    payload_offset: 27,
};

impl FrameLayout {
    /// Pull the endpoint number and HID payload out of a raw frame.
    ///
    /// `None` when the frame is shorter than this wrapper's minimum or
    /// carries no payload bytes — the caller skips it and keeps scanning.
    pub fn extract<'a>(&self, frame: &'a [u8]) -> Option<(u8, &'a [u8])> {
        if frame.len() < self.min_len {
            return None;
        }
        let endpoint = frame[self.endpoint_offset] & self.endpoint_mask;
        let payload = frame.get(self.payload_offset..)?;
        if payload.is_empty() {
            return None;
        }
        Some((endpoint, payload))
    }
}
