use crate::id::HeadsetId;

/// Errors that can occur while binding to or talking with a headset.
#[derive(Debug, thiserror::Error)]
pub enum HeadsetError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mindlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] mindlink_frame::FrameError),

    /// The dongle reports it has never seen any headset.
    #[error("no headset found")]
    NoHeadsetEverFound,

    /// The dongle could not find the requested headset.
    #[error("headset {0} not found")]
    RequestedHeadsetNotFound(HeadsetId),

    /// The headset disconnected during the handshake.
    #[error("headset disconnected")]
    Disconnected,

    /// The dongle refused the request.
    #[error("request denied by dongle")]
    RequestDenied,

    /// The dongle answered with a tag that is not part of the handshake.
    #[error("unexpected response tag 0x{0:02X}")]
    UnexpectedResponse(u8),

    /// A handshake response was too short for its tag.
    #[error("malformed response 0x{tag:02X} ({len} bytes)")]
    MalformedResponse { tag: u8, len: usize },

    /// The dongle kept scanning past the configured search timeout.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// The poll thread could not be started.
    #[error("failed to start poll thread: {0}")]
    Spawn(std::io::Error),

    /// The poll thread died before handing the channel back.
    #[error("poll thread panicked")]
    PollPanicked,

    /// The link is not connected.
    #[error("headset not connected")]
    NotConnected,
}

impl HeadsetError {
    /// Whether the dongle itself refused or failed the binding.
    pub fn is_handshake_failure(&self) -> bool {
        matches!(
            self,
            HeadsetError::NoHeadsetEverFound
                | HeadsetError::RequestedHeadsetNotFound(_)
                | HeadsetError::Disconnected
                | HeadsetError::RequestDenied
                | HeadsetError::UnexpectedResponse(_)
                | HeadsetError::MalformedResponse { .. }
                | HeadsetError::HandshakeTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HeadsetError>;
