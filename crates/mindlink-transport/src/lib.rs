//! Byte-channel abstraction for headset links.
//!
//! The headset dongle is a plain serial device. Everything above this crate
//! talks to it through the [`ByteChannel`] trait:
//! - [`SerialChannel`] drives a real serial port
//! - [`MemoryChannel`] is an in-memory stand-in for tests and capture replay
//!
//! This is the lowest layer of mindlink. Reads block for at most the
//! configured per-byte timeout; short reads are errors.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryChannel;
pub use serial::{available_ports, PortInfo, SerialChannel, DEFAULT_BAUD_RATE};
pub use traits::ByteChannel;
