//! Serial telemetry decoder and link manager for single-channel EEG headsets.
//!
//! mindlink binds a host to a headset through its USB dongle, decodes the
//! dongle's packet stream on a background thread and serves consistent
//! snapshots of the latest readings.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-channel abstraction (serial port, in-memory)
//! - [`frame`]: Sync-marker packet framing with checksum validation
//! - [`headset`]: Handshake, payload decoding and polling (behind `headset` feature)

/// Re-export transport types.
pub mod transport {
    pub use mindlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mindlink_frame::*;
}

/// Re-export headset types (requires `headset` feature).
#[cfg(feature = "headset")]
pub mod headset {
    pub use mindlink_headset::*;
}
