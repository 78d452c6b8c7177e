use bytes::{BufMut, BytesMut};
use mindlink_transport::ByteChannel;
use tracing::debug;

use crate::error::Result;
use crate::id::HeadsetId;

/// Host command: bind to a specific headset (`0xC0 idHigh idLow`).
pub const CMD_CONNECT: u8 = 0xC0;
/// Host command: drop any current binding.
pub const CMD_DISCONNECT: u8 = 0xC1;
/// Host command: bind to any headset in range.
pub const CMD_AUTO_CONNECT: u8 = 0xC2;

/// Dongle response: headset found and connected.
pub const RESP_CONNECTED: u8 = 0xD0;
/// Dongle response: headset not found.
pub const RESP_NOT_FOUND: u8 = 0xD1;
/// Dongle response: headset disconnected.
pub const RESP_DISCONNECTED: u8 = 0xD2;
/// Dongle response: request denied.
pub const RESP_DENIED: u8 = 0xD3;
/// Dongle response: standby or scanning status.
pub const RESP_STANDBY: u8 = 0xD4;

/// Commands the host sends to the dongle. These are raw bytes, not framed
/// packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Bind to the given headset.
    Connect(HeadsetId),
    /// Drop the current binding.
    Disconnect,
    /// Bind to any headset in range.
    AutoConnect,
}

impl Command {
    /// The binding command for `id`: auto-connect for [`HeadsetId::ANY`].
    pub fn bind(id: HeadsetId) -> Self {
        if id.is_any() {
            Command::AutoConnect
        } else {
            Command::Connect(id)
        }
    }

    /// Append the wire bytes of this command.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Command::Connect(id) => {
                dst.put_u8(CMD_CONNECT);
                dst.put_u8(id.high());
                dst.put_u8(id.low());
            }
            Command::Disconnect => dst.put_u8(CMD_DISCONNECT),
            Command::AutoConnect => dst.put_u8(CMD_AUTO_CONNECT),
        }
    }
}

/// Encode and write a command.
pub fn send_command<C: ByteChannel + ?Sized>(channel: &mut C, command: Command) -> Result<()> {
    let mut buf = BytesMut::with_capacity(3);
    command.encode(&mut buf);
    channel.write_all(&buf)?;
    debug!(?command, "command sent");
    Ok(())
}
