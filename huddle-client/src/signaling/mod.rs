mod channel;
mod websocket;

pub use channel::{ChannelEvent, SignalingChannel, SignalingOutput};
pub use websocket::WebsocketSignalingChannel;
