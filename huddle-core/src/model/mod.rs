mod message;
mod peer;
mod room;
mod sdp;

pub use message::{Message, MessageType, SignalPayload};
pub use peer::PeerId;
pub use room::{RoomId, RoomInfo};
pub use sdp::{SdpKind, SessionDescription};
