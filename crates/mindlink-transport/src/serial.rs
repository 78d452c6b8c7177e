use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use serialport::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits,
};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::ByteChannel;

/// Line speed of the headset dongle.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

const DRAIN_CHUNK_SIZE: usize = 256;

/// A serial device visible on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name (e.g. `/dev/ttyUSB0`, `COM3`).
    pub name: String,
    /// `usb`, `bluetooth`, `pci` or `unknown`.
    pub kind: &'static str,
    /// Product and vendor details, for USB devices.
    pub description: Option<String>,
}

/// List serial devices the dongle could be attached to.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, description) = match port.port_type {
                SerialPortType::UsbPort(usb) => {
                    let product = usb
                        .product
                        .or(usb.manufacturer)
                        .unwrap_or_else(|| "USB serial".to_string());
                    (
                        "usb",
                        Some(format!("{product} [{:04x}:{:04x}]", usb.vid, usb.pid)),
                    )
                }
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                description,
            }
        })
        .collect())
}

/// Serial port transport for the headset dongle (8N1, no flow control).
pub struct SerialChannel {
    port: Option<Box<dyn SerialPort>>,
    path: String,
    timeout: Duration,
}

impl SerialChannel {
    /// Open the named serial device with the given per-byte read timeout.
    pub fn open(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let path = path.into();
        let port = serialport::new(path.as_str(), baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(%path, baud_rate, ?timeout, "serial port opened");
        Ok(Self {
            port: Some(port),
            path,
            timeout,
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl ByteChannel for SerialChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        trace!(len = bytes.len(), "serial write");
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let timeout = self.timeout;
        let port = self.port_mut()?;
        loop {
            match port.read_exact(buf) {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_read(err, timeout)),
            }
        }
    }

    fn flush_input(&mut self, window: Duration) -> Result<()> {
        let timeout = self.timeout;
        let port = self.port_mut()?;
        let deadline = Instant::now() + window;
        let mut chunk = [0u8; DRAIN_CHUNK_SIZE];
        let mut drained = 0usize;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            port.set_timeout(remaining.min(timeout))?;
            match port.read(&mut chunk) {
                Ok(n) => drained += n,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) => {}
                Err(err) => {
                    port.set_timeout(timeout)?;
                    return Err(TransportError::Io(err));
                }
            }
        }

        port.set_timeout(timeout)?;
        port.clear(ClearBuffer::Input)?;
        debug!(drained, ?window, "serial input flushed");
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(path = %self.path, "serial port closed");
        }
    }

    fn read_timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_reports_path() {
        let err = SerialChannel::open(
            "/dev/mindlink-does-not-exist",
            DEFAULT_BAUD_RATE,
            Duration::from_millis(10),
        )
        .unwrap_err();

        match err {
            TransportError::Open { path, .. } => assert_eq!(path, "/dev/mindlink-does-not-exist"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeout_and_eof_map_to_dedicated_variants() {
        let timeout = Duration::from_millis(5);
        let err = TransportError::from_read(std::io::Error::from(ErrorKind::TimedOut), timeout);
        assert!(matches!(err, TransportError::Timeout(t) if t == timeout));

        let err =
            TransportError::from_read(std::io::Error::from(ErrorKind::UnexpectedEof), timeout);
        assert!(matches!(err, TransportError::Closed));

        let err =
            TransportError::from_read(std::io::Error::from(ErrorKind::BrokenPipe), timeout);
        assert!(matches!(err, TransportError::Io(_)));
    }
}
