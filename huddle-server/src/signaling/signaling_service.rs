use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message as WsMessage;
use dashmap::DashMap;
use huddle_core::model::{Message, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<WsMessage>>,
}

/// Registry of connected websockets, keyed by the relay-minted peer id.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<WsMessage>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn send_signal(&self, peer_id: &PeerId, message: &Message) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(message) {
                Ok(json) => {
                    if let Err(e) = peer.send(WsMessage::Text(json.into())) {
                        error!("Failed to send WS message to {peer_id}: {e:?}");
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {e}"),
            }
        } else {
            warn!("Attempted to send signal to disconnected peer {peer_id}");
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_to(&self, peer_id: &PeerId, message: Message) {
        self.send_signal(peer_id, &message);
    }
}
