use crate::media::{StreamId, StreamKind};
use crate::transport::ConnectionState;
use huddle_core::model::PeerId;

/// Events an engine reports up to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StreamAdded {
        peer: PeerId,
        stream: StreamId,
        kind: StreamKind,
    },
    StreamRemoved {
        peer: PeerId,
        stream: StreamId,
        kind: StreamKind,
    },
    Muted {
        peer: PeerId,
    },
    Unmuted {
        peer: PeerId,
    },
    ConnectionChanged {
        peer: PeerId,
        state: ConnectionState,
    },
    /// The engine task finished, either on `Close` or because its
    /// transport went away.
    Closed {
        peer: PeerId,
    },
}
