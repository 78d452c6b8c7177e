use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Sync byte; two in a row start a packet.
pub const SYNC: u8 = 0xAA;

/// Sync marker preceding every packet.
pub const SYNC_MARKER: [u8; 2] = [SYNC, SYNC];

/// Largest payload a packet can carry. A length byte of `0xAA` is a sync
/// artifact, so valid lengths stop one short of it.
pub const MAX_PAYLOAD_LEN: usize = SYNC as usize - 1;

/// A checksum-validated packet payload held on the stack.
#[derive(Clone, Copy)]
pub struct RawPacket {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: u8,
}

impl RawPacket {
    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// First payload byte: a response tag or the first record byte.
    pub fn tag(&self) -> u8 {
        self.buf[0]
    }

    /// Payload length in bytes (never zero).
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; packets carry at least one byte.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload buffer to be filled by the reader.
    pub(crate) fn zeroed(len: u8) -> Self {
        Self {
            buf: [0u8; MAX_PAYLOAD_LEN],
            len,
        }
    }

    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len as usize]
    }
}

impl AsRef<[u8]> for RawPacket {
    fn as_ref(&self) -> &[u8] {
        self.payload()
    }
}

impl PartialEq for RawPacket {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl Eq for RawPacket {}

impl std::fmt::Debug for RawPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawPacket")
            .field("len", &self.len)
            .field("payload", &format_args!("{:02X?}", self.payload()))
            .finish()
    }
}

/// One's complement of the low byte of the payload sum.
pub fn checksum(payload: &[u8]) -> u8 {
    !payload.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Encode a device packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬─────────────────┬──────────┐
/// │ Sync (2B)    │ Length   │ Payload         │ Checksum │
/// │ 0xAA 0xAA    │ (1B)     │ (Length bytes)  │ (1B)     │
/// └──────────────┴──────────┴─────────────────┴──────────┘
/// ```
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    validate_len(payload.len())?;
    dst.reserve(SYNC_MARKER.len() + 2 + payload.len());
    dst.put_slice(&SYNC_MARKER);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    dst.put_u8(checksum(payload));
    Ok(())
}

fn validate_len(len: usize) -> Result<()> {
    if len == 0 || len > MAX_PAYLOAD_LEN {
        return Err(FrameError::InvalidLength {
            len,
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(())
}
