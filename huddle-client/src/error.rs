use thiserror::Error;

/// Failures of the signaling channel itself; message-level decode problems
/// surface as channel events instead.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("signaling transport failed: {0}")]
    Transport(String),

    #[error("signaling channel is not connected")]
    NotConnected,

    #[error("failed to encode signaling message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webrtc: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("malformed candidate payload: {0}")]
    BadCandidate(serde_json::Error),

    #[error("control channel is not open")]
    ControlClosed,

    #[error("transport operation failed: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
