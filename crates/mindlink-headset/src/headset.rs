use std::time::Duration;

use mindlink_frame::PacketReader;
use mindlink_transport::{ByteChannel, SerialChannel, DEFAULT_BAUD_RATE};
use tracing::{debug, info, warn};

use crate::command::{send_command, Command};
use crate::error::Result;
use crate::handshake::{handshake, HandshakeConfig};
use crate::id::HeadsetId;
use crate::poller::{PollConfig, PollHandle, Poller};
use crate::reading::{SensorReading, SharedReading};

/// Configuration for a headset link.
#[derive(Debug, Clone)]
pub struct HeadsetConfig {
    /// Headset to bind to; [`HeadsetId::ANY`] auto-connects.
    pub headset_id: HeadsetId,
    /// Serial line speed.
    pub baud_rate: u32,
    /// Per-byte read timeout.
    pub read_timeout: Duration,
    pub handshake: HandshakeConfig,
    pub poll: PollConfig,
}

impl Default for HeadsetConfig {
    fn default() -> Self {
        Self {
            headset_id: HeadsetId::ANY,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            handshake: HandshakeConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

/// A live link to one headset.
///
/// The channel belongs to the background poll thread while the link is up;
/// callers read the latest values through [`snapshot`](Self::snapshot).
pub struct Headset<C: ByteChannel + 'static = SerialChannel> {
    id: HeadsetId,
    reading: SharedReading,
    poll: Option<PollHandle<C>>,
    flush_window: Duration,
}

impl Headset<SerialChannel> {
    /// Open the dongle at `path` and bind to the configured headset.
    pub fn connect(path: &str, config: HeadsetConfig) -> Result<Self> {
        info!(%path, "opening dongle");
        let channel = SerialChannel::open(path, config.baud_rate, config.read_timeout)?;
        Self::connect_with(channel, config)
    }
}

impl<C: ByteChannel + 'static> Headset<C> {
    /// Bind to a headset over an already open channel and start polling.
    ///
    /// The channel is closed if the handshake fails.
    pub fn connect_with(channel: C, config: HeadsetConfig) -> Result<Self> {
        let mut reader = PacketReader::new(channel);
        let id = match handshake(&mut reader, config.headset_id, &config.handshake) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, "handshake failed");
                reader.get_mut().close();
                return Err(err);
            }
        };

        let reading = SharedReading::new();
        let poll = Poller::spawn(reader, reading.clone(), config.poll)?;
        info!(headset_id = %id, "headset connected");

        Ok(Self {
            id,
            reading,
            poll: Some(poll),
            flush_window: config.handshake.flush_window,
        })
    }

    /// Stop polling, release the headset and close the channel.
    ///
    /// Does nothing on a link that is already disconnected. A failed
    /// Disconnect command is logged and otherwise ignored.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(poll) = self.poll.take() else {
            return Ok(());
        };

        let mut channel = poll.stop()?;
        if let Err(err) = send_command(&mut channel, Command::Disconnect) {
            warn!(%err, "disconnect command not delivered");
        }
        if let Err(err) = channel.flush_input(self.flush_window) {
            debug!(%err, "input flush on disconnect failed");
        }
        channel.close();

        info!(headset_id = %self.id, "headset disconnected");
        Ok(())
    }

    /// Whether the link is up and its poll loop is still running.
    pub fn is_connected(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_running)
    }

    /// Id of the bound headset. Kept after disconnecting.
    pub fn global_headset_id(&self) -> HeadsetId {
        self.id
    }

    /// Copy of the latest reading.
    pub fn snapshot(&self) -> SensorReading {
        self.reading.snapshot()
    }

    /// Read-only handle to the latest reading, for other threads. It keeps
    /// following the poll thread and only hands out copies.
    pub fn reading(&self) -> SharedReading {
        self.reading.clone()
    }

    /// Packets decoded since connecting.
    pub fn packets(&self) -> u64 {
        self.poll.as_ref().map_or(0, PollHandle::packets)
    }
}

impl<C: ByteChannel + 'static> Drop for Headset<C> {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            warn!(%err, "disconnect on drop failed");
        }
    }
}

impl<C: ByteChannel + 'static> std::fmt::Debug for Headset<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Headset")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
