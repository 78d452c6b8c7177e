//! Headset link management.
//!
//! This is the "just works" layer. Bind to a headset through its dongle,
//! keep the latest decoded reading up to date on a background thread, and
//! hand out consistent snapshots.

pub mod command;
pub mod connector;
pub mod decoder;
pub mod error;
pub mod handshake;
pub mod headset;
pub mod id;
pub mod poller;
pub mod reading;

pub use command::{
    send_command, Command, CMD_AUTO_CONNECT, CMD_CONNECT, CMD_DISCONNECT, RESP_CONNECTED,
    RESP_DENIED, RESP_DISCONNECTED, RESP_NOT_FOUND, RESP_STANDBY,
};
pub use connector::{connect, connect_with_config};
pub use decoder::{decode, DecodeError, Record, Records};
pub use error::{HeadsetError, Result};
pub use handshake::{handshake, HandshakeConfig};
pub use headset::{Headset, HeadsetConfig};
pub use id::HeadsetId;
pub use poller::{PollConfig, PollHandle, Poller};
pub use reading::{BandPowers, SensorReading, SharedReading};
