use std::time::Duration;

/// Errors that can occur on a headset byte channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// A serial port setting could not be applied.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No byte arrived within the per-byte timeout.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The channel has been closed or its input is exhausted.
    #[error("channel closed")]
    Closed,
}

impl TransportError {
    /// Map a read error, folding timeouts and EOF into their own variants.
    pub(crate) fn from_read(err: std::io::Error, timeout: Duration) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout(timeout),
            std::io::ErrorKind::UnexpectedEof => Self::Closed,
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
