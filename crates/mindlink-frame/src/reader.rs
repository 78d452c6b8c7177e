use mindlink_transport::ByteChannel;
use tracing::trace;

use crate::codec::{checksum, RawPacket, SYNC};
use crate::error::{FrameError, Result};

/// Bytes a single call may scan while hunting for a sync marker before it
/// gives up with [`FrameError::NoSync`].
pub const MAX_SYNC_SCAN: usize = 512;

/// Reads checksum-validated packets from any [`ByteChannel`].
///
/// Bytes before a sync marker are skipped, so a reader can start mid-stream.
/// Nothing is buffered between calls: a failed attempt leaves no state
/// behind and the next call resynchronizes from scratch. The hunt for a
/// marker is bounded by [`MAX_SYNC_SCAN`], so a line carrying only noise
/// still returns control to the caller regularly.
pub struct PacketReader<C> {
    inner: C,
}

impl<C> PacketReader<C> {
    /// Create a packet reader over a channel.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the reader and return the inner channel.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: ByteChannel> PacketReader<C> {
    /// Read the next valid packet (blocking, bounded by the channel's
    /// per-byte timeout).
    pub fn read_packet(&mut self) -> Result<RawPacket> {
        let len = self.sync()?;
        if len == 0 {
            return Err(FrameError::ZeroLength);
        }

        let mut packet = RawPacket::zeroed(len);
        self.inner.read_exact(packet.payload_mut())?;
        let received = self.inner.read_byte()?;

        let expected = checksum(packet.payload());
        if expected != received {
            return Err(FrameError::Checksum { expected, received });
        }

        trace!(len, tag = packet.tag(), "packet framed");
        Ok(packet)
    }

    /// Hunt for the sync marker and return the length byte that follows it.
    fn sync(&mut self) -> Result<u8> {
        let mut scanned = 0usize;
        loop {
            if self.scan_byte(&mut scanned)? != SYNC {
                continue;
            }
            if self.scan_byte(&mut scanned)? != SYNC {
                continue;
            }

            let mut len = self.scan_byte(&mut scanned)?;
            while len == SYNC {
                len = self.scan_byte(&mut scanned)?;
            }
            if len > SYNC {
                continue;
            }

            if scanned > 3 {
                trace!(skipped = scanned - 3, "resynchronized on sync marker");
            }
            return Ok(len);
        }
    }

    fn scan_byte(&mut self, scanned: &mut usize) -> Result<u8> {
        if *scanned == MAX_SYNC_SCAN {
            return Err(FrameError::NoSync { scanned: *scanned });
        }
        *scanned += 1;
        Ok(self.inner.read_byte()?)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use mindlink_transport::{MemoryChannel, TransportError};

    use super::*;
    use crate::codec::{encode_packet, MAX_PAYLOAD_LEN};

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_packet(payload, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn read_single_packet() {
        let mut reader = PacketReader::new(MemoryChannel::replay(wire(&[0x04, 0x32])));
        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.payload(), &[0x04, 0x32]);
    }

    #[test]
    fn read_multiple_packets() {
        let mut bytes = wire(&[0x02, 0x00]);
        bytes.extend(wire(&[0x04, 0x50]));
        bytes.extend(wire(&[0xD4, 0x01, 0x00]));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x02, 0x00]);
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x04, 0x50]);
        assert_eq!(reader.read_packet().unwrap().payload(), &[0xD4, 0x01, 0x00]);
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::Transport(TransportError::Closed)
        ));
    }

    #[test]
    fn skips_leading_noise() {
        let mut bytes = vec![0x00, 0x13, 0xAA, 0x01, 0xFF, 0xAA];
        bytes.extend(wire(&[0x05, 0x3C]));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x05, 0x3C]);
    }

    #[test]
    fn length_above_sync_restarts_search() {
        let mut bytes = vec![0xAA, 0xAA, 0xC0];
        bytes.extend(wire(&[0x16, 0x40]));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x16, 0x40]);
    }

    #[test]
    fn length_equal_to_sync_is_reread() {
        let payload = [0x02, 0x1A];
        let mut bytes = vec![0xAA, 0xAA, 0xAA, 0xAA, 0x02];
        bytes.extend_from_slice(&payload);
        bytes.push(checksum(&payload));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.len(), 2);
        assert_eq!(packet.payload(), &payload);
    }

    #[test]
    fn zero_length_is_an_error() {
        let mut reader = PacketReader::new(MemoryChannel::replay([0xAA, 0xAA, 0x00]));
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::ZeroLength
        ));
    }

    #[test]
    fn max_length_packet_is_accepted() {
        let payload: Vec<u8> = (0..MAX_PAYLOAD_LEN).map(|i| i as u8).collect();
        let bytes = wire(&payload);
        assert_eq!(bytes[2], 0xA9);

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert_eq!(reader.read_packet().unwrap().payload(), payload.as_slice());
    }

    #[test]
    fn checksum_mismatch_discards_packet() {
        let mut bytes = wire(&[0x04, 0x32]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        bytes.extend(wire(&[0x05, 0x10]));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::Checksum { .. }
        ));
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x05, 0x10]);
    }

    #[test]
    fn any_flipped_bit_is_rejected() {
        let payload = [0x02, 0x00, 0x04, 0x35, 0x05, 0x2A, 0x80, 0x02, 0xFF, 0x10];
        let good = wire(&payload);
        let body = 3..good.len();

        for index in body {
            for bit in 0..8 {
                let mut bytes = good.clone();
                bytes[index] ^= 1 << bit;
                let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
                let result = reader.read_packet();
                assert!(
                    matches!(result, Err(FrameError::Checksum { .. })),
                    "byte {index} bit {bit}: {result:?}"
                );
            }
        }
    }

    #[test]
    fn timeout_mid_payload_is_transport_error() {
        let channel = MemoryChannel::with_timeout(std::time::Duration::from_millis(5));
        channel.feed([0xAA, 0xAA, 0x04, 0x01]);

        let mut reader = PacketReader::new(channel);
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::Transport(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn noise_only_line_gives_up_after_scan_limit() {
        let channel = MemoryChannel::with_timeout(std::time::Duration::from_millis(50));
        channel.feed(vec![0x00; MAX_SYNC_SCAN * 2]);

        let mut reader = PacketReader::new(channel.clone());
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::NoSync { scanned: MAX_SYNC_SCAN }
        ));
        assert_eq!(channel.pending(), MAX_SYNC_SCAN);
    }

    #[test]
    fn endless_sync_run_gives_up_after_scan_limit() {
        let channel = MemoryChannel::with_timeout(std::time::Duration::from_millis(50));
        channel.feed(vec![SYNC; MAX_SYNC_SCAN + 10]);

        let mut reader = PacketReader::new(channel);
        let err = reader.read_packet().unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, FrameError::NoSync { .. }));
    }

    #[test]
    fn packet_after_long_noise_is_found_on_retry() {
        let mut bytes = vec![0x13; MAX_SYNC_SCAN + 40];
        bytes.extend(wire(&[0x04, 0x21]));

        let mut reader = PacketReader::new(MemoryChannel::replay(bytes));
        assert!(matches!(
            reader.read_packet().unwrap_err(),
            FrameError::NoSync { .. }
        ));
        assert_eq!(reader.read_packet().unwrap().payload(), &[0x04, 0x21]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = PacketReader::new(MemoryChannel::new());
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
