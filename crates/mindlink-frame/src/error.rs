use mindlink_transport::TransportError;

/// Errors that can occur while framing a device packet.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The length byte after the sync marker was zero.
    #[error("zero-length packet")]
    ZeroLength,

    /// The checksum byte did not match the payload.
    #[error("checksum mismatch (expected 0x{expected:02X}, received 0x{received:02X})")]
    Checksum { expected: u8, received: u8 },

    /// No sync marker turned up within the scan limit.
    #[error("no sync marker in {scanned} bytes")]
    NoSync { scanned: usize },

    /// The payload handed to the encoder does not fit a packet.
    #[error("invalid payload length {len} (must be 1..={max})")]
    InvalidLength { len: usize, max: usize },

    /// The underlying channel failed mid-frame.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Whether the error only affected the current packet.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FrameError::Checksum { .. } | FrameError::ZeroLength | FrameError::NoSync { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
