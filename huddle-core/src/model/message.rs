use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// Closed set of envelope types on the signaling wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageType {
    // From client
    Join,
    Negotiation,

    // From server
    RemovePeer,
    RoomClosed,
}

/// Discriminated negotiation payload: a serialized description blob or a
/// serialized candidate blob, never both. The blobs stay opaque at this
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SignalPayload {
    Sdp { sdp: String },
    Candidate { candidate: String },
}

/// The signaling envelope. `from` is stamped by the relay on delivery and
/// absent on locally originated messages; `to` addresses point-to-point
/// routing and is absent on server-originated messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SignalPayload>,
}

impl Message {
    /// Announce presence to the relay.
    pub fn join() -> Self {
        Self {
            message_type: MessageType::Join,
            from: None,
            to: None,
            data: None,
        }
    }

    /// Empty-payload negotiation request: asks the receiver to originate
    /// an offer toward `from`.
    pub fn offer_request(from: PeerId) -> Self {
        Self {
            message_type: MessageType::Negotiation,
            from: Some(from),
            to: None,
            data: None,
        }
    }

    /// Negotiation envelope carrying a serialized session description.
    pub fn sdp(to: PeerId, sdp: String) -> Self {
        Self {
            message_type: MessageType::Negotiation,
            from: None,
            to: Some(to),
            data: Some(SignalPayload::Sdp { sdp }),
        }
    }

    /// Negotiation envelope carrying a serialized connectivity candidate.
    pub fn candidate(to: PeerId, candidate: String) -> Self {
        Self {
            message_type: MessageType::Negotiation,
            from: None,
            to: Some(to),
            data: Some(SignalPayload::Candidate { candidate }),
        }
    }

    /// Server notice that `peer` left the room.
    pub fn remove_peer(peer: PeerId) -> Self {
        Self {
            message_type: MessageType::RemovePeer,
            from: Some(peer),
            to: None,
            data: None,
        }
    }

    /// Server notice that the room is gone for good.
    pub fn room_closed() -> Self {
        Self {
            message_type: MessageType::RoomClosed,
            from: None,
            to: None,
            data: None,
        }
    }
}
