use std::time::{Duration, Instant};

use mindlink_frame::{FrameError, PacketReader, RawPacket};
use mindlink_transport::ByteChannel;
use tracing::{debug, info};

use crate::command::{
    send_command, Command, RESP_CONNECTED, RESP_DENIED, RESP_DISCONNECTED, RESP_NOT_FOUND,
    RESP_STANDBY,
};
use crate::error::{HeadsetError, Result};
use crate::id::HeadsetId;

/// Configuration for binding to a headset.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// How long to drain stale input after the initial Disconnect.
    pub flush_window: Duration,
    /// Pause between status packets while the dongle is still scanning.
    pub search_pause: Duration,
    /// Give up if the dongle is still scanning after this long.
    /// `None` waits for as long as the dongle keeps answering.
    pub search_timeout: Option<Duration>,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            flush_window: Duration::from_secs(1),
            search_pause: Duration::from_millis(1),
            search_timeout: None,
        }
    }
}

/// What a single dongle response means for the handshake.
#[derive(Debug)]
enum Step {
    /// Bound; carries the id echoed by the dongle when it sent one.
    Bound(Option<HeadsetId>),
    /// Still scanning for the headset.
    Scanning,
    Failed(HeadsetError),
}

/// Bind the dongle behind `reader` to a headset.
///
/// Clears any previous binding, requests `requested` (or any headset when it
/// is [`HeadsetId::ANY`]) and waits for a terminal response. Returns the id
/// the link is bound to. Checksum errors and marker hunts that come up
/// empty are skipped while waiting; every other framing error ends the
/// handshake.
pub fn handshake<C: ByteChannel>(
    reader: &mut PacketReader<C>,
    requested: HeadsetId,
    config: &HandshakeConfig,
) -> Result<HeadsetId> {
    send_command(reader.get_mut(), Command::Disconnect)?;
    reader.get_mut().flush_input(config.flush_window)?;

    let command = Command::bind(requested);
    info!(headset_id = %requested, ?command, "binding headset");
    send_command(reader.get_mut(), command)?;

    let deadline = config.search_timeout.map(|timeout| Instant::now() + timeout);
    loop {
        if let (Some(deadline), Some(timeout)) = (deadline, config.search_timeout) {
            if Instant::now() >= deadline {
                return Err(HeadsetError::HandshakeTimeout(timeout));
            }
        }

        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(FrameError::Checksum { expected, received }) => {
                debug!(expected, received, "ignoring corrupt packet during handshake");
                continue;
            }
            Err(FrameError::NoSync { scanned }) => {
                debug!(scanned, "no sync marker yet during handshake");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        match interpret(&packet, requested) {
            Step::Bound(echoed) => {
                let id = echoed.unwrap_or(requested);
                info!(headset_id = %id, "headset bound");
                return Ok(id);
            }
            Step::Scanning => {
                debug!("dongle still scanning");
                std::thread::sleep(config.search_pause);
            }
            Step::Failed(err) => return Err(err),
        }
    }
}

fn interpret(packet: &RawPacket, requested: HeadsetId) -> Step {
    let payload = packet.payload();
    let tag = packet.tag();
    let need = |len: usize| {
        if payload.len() < len {
            Err(HeadsetError::MalformedResponse {
                tag,
                len: payload.len(),
            })
        } else {
            Ok(())
        }
    };

    let step = match tag {
        RESP_CONNECTED => {
            need(4).map(|()| Step::Bound(Some(HeadsetId::from_bytes(payload[2], payload[3]))))
        }
        RESP_NOT_FOUND => need(2).map(|()| {
            if payload[1] == 0 {
                Step::Failed(HeadsetError::NoHeadsetEverFound)
            } else {
                Step::Failed(HeadsetError::RequestedHeadsetNotFound(requested))
            }
        }),
        RESP_DISCONNECTED => Ok(Step::Failed(HeadsetError::Disconnected)),
        RESP_DENIED => Ok(Step::Failed(HeadsetError::RequestDenied)),
        RESP_STANDBY => need(3).map(|()| {
            if payload[2] == 0 {
                Step::Bound(None)
            } else {
                Step::Scanning
            }
        }),
        other => Ok(Step::Failed(HeadsetError::UnexpectedResponse(other))),
    };

    step.unwrap_or_else(Step::Failed)
}
