pub mod model;

pub use model::{
    Message, MessageType, PeerId, RoomId, RoomInfo, SdpKind, SessionDescription, SignalPayload,
};
