use std::time::Duration;

use crate::error::Result;

/// A duplex byte channel to a headset dongle.
///
/// Implementations block on reads for at most their per-byte timeout and
/// report short reads as errors, so a caller always gets either the full
/// buffer or a [`TransportError`](crate::TransportError).
pub trait ByteChannel: Send {
    /// Write every byte of `bytes` and flush.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Fill `buf` completely.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read a single byte.
    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Discard pending input, draining the line for up to `window`.
    fn flush_input(&mut self, window: Duration) -> Result<()>;

    /// Release the underlying device. Later reads and writes fail with
    /// [`TransportError::Closed`](crate::TransportError::Closed).
    fn close(&mut self);

    /// Per-byte read timeout currently in effect.
    fn read_timeout(&self) -> Duration;
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn flush_input(&mut self, window: Duration) -> Result<()> {
        (**self).flush_input(window)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn read_timeout(&self) -> Duration {
        (**self).read_timeout()
    }
}
