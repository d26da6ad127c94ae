use async_trait::async_trait;
use huddle_core::model::{Message, PeerId};

/// Outbound seam a room uses to reach clients, so room logic stays
/// independent of the websocket layer.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver an envelope to one connected peer.
    async fn send_to(&self, peer_id: &PeerId, message: Message);
}
