use crate::media::{StreamId, StreamKind};
use crate::transport::ConnectionState;
use huddle_core::model::PeerId;

/// Events the surrounding application renders UI from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection registry membership changed; carries the current
    /// member snapshot.
    Connect { peers: Vec<PeerId> },
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
    Muted(PeerId),
    Unmuted(PeerId),
    ConnectivityChanged {
        peer: PeerId,
        state: ConnectionState,
    },
    /// The relay closed the room; the session is terminating.
    RoomClosed,
    Error(String),
}
