use crate::error::TransportError;
use crate::media::{LocalStream, LocalTrack, StreamId, TrackId};
use async_trait::async_trait;
use huddle_core::model::{PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle to a transport-level sender created by `add_track`, used by the
/// engine's sender registry to make attach/detach idempotent.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SenderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Notifications from the underlying real-time transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// The transport's required description drifted from the applied one
    /// (a track was added or removed); the owner should originate an
    /// offer.
    NegotiationNeeded,
    /// A locally gathered connectivity candidate, serialized for the wire.
    CandidateGathered(String),
    /// A remote track arrived, tagged with the stream it belongs to.
    TrackAdded { stream: StreamId, track: TrackId },
    /// A remote track ended.
    TrackEnded { stream: StreamId, track: TrackId },
    /// The locally created control sub-channel is open for writes.
    ControlOpen,
    /// An inbound control token.
    ControlMessage(String),
    ConnectionState(ConnectionState),
    /// The transport returned to a stable signaling state.
    SignalingStable,
}

/// Capability interface over the real-time transport a
/// [`crate::engine::NegotiationEngine`] drives. One instance per remote
/// peer; events arrive on the mpsc receiver minted alongside it.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError>;

    async fn set_remote_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError>;

    /// Apply a remote connectivity candidate. Only valid once a remote
    /// description has been applied.
    async fn add_ice_candidate(&self, candidate: &str) -> Result<(), TransportError>;

    async fn add_track(
        &self,
        track: &LocalTrack,
        stream: &LocalStream,
    ) -> Result<SenderId, TransportError>;

    async fn remove_track(&self, sender: SenderId) -> Result<(), TransportError>;

    /// Send a token over the control sub-channel.
    async fn send_control(&self, token: &str) -> Result<(), TransportError>;

    /// Close the transport and its control sub-channel. Idempotent.
    async fn close(&self);
}

/// Mints one transport (and its event stream) per remote peer.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create_transport(
        &self,
        peer_id: &PeerId,
    ) -> Result<(Arc<dyn MediaTransport>, mpsc::Receiver<TransportEvent>), TransportError>;
}
