//! Packet framing for the headset telemetry stream.
//!
//! Every device packet is framed as:
//! - A 2-byte sync marker (`0xAA 0xAA`)
//! - A 1-byte payload length (1..=169)
//! - The payload
//! - A 1-byte checksum (one's complement of the truncated payload sum)
//!
//! [`PacketReader`] resynchronizes on the marker, so callers never see noise
//! or partial packets.

pub mod codec;
pub mod error;
pub mod reader;

pub use codec::{checksum, encode_packet, RawPacket, MAX_PAYLOAD_LEN, SYNC, SYNC_MARKER};
pub use error::{FrameError, Result};
pub use reader::{PacketReader, MAX_SYNC_SCAN};
