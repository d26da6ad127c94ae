use crate::room::RoomCommand;
use crate::signaling::SignalingOutput;
use huddle_core::model::{Message, MessageType, PeerId, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One room's event loop. Holds members in join order: a `Join` fans an
/// empty `Negotiation` out to everyone registered *before* the joiner,
/// which is what keeps two sides from ever originating offers at each
/// other simultaneously.
pub struct Room {
    id: RoomId,
    members: Vec<PeerId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    idle_timeout: Duration,
    member_count: Arc<AtomicUsize>,
}

impl Room {
    pub fn new(
        id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        idle_timeout: Duration,
        member_count: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            members: Vec::new(),
            command_rx,
            signaling,
            idle_timeout,
            member_count,
        }
    }

    pub async fn run(mut self) {
        info!("Room {} started", self.id);

        // The room dies if nobody joins it within the idle window.
        let idle = tokio::time::sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                () = &mut idle, if self.members.is_empty() => {
                    info!("Room {} closed after idle timeout", self.id);
                    break;
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(RoomCommand::Register { peer_id }) => self.register(peer_id),
                        Some(RoomCommand::Unregister { peer_id }) => {
                            self.unregister(&peer_id).await;
                            if self.members.is_empty() {
                                break;
                            }
                        }
                        Some(RoomCommand::Inbound { message }) => self.route(message).await,
                        Some(RoomCommand::Shutdown) | None => {
                            self.broadcast(Message::room_closed()).await;
                            break;
                        }
                    }
                }
            }
        }

        info!("Room {} finished", self.id);
    }

    fn register(&mut self, peer_id: PeerId) {
        info!("Peer {peer_id} registered in room {}", self.id);
        self.members.push(peer_id);
        self.member_count.store(self.members.len(), Ordering::SeqCst);
    }

    async fn unregister(&mut self, peer_id: &PeerId) {
        let Some(position) = self.members.iter().position(|m| m == peer_id) else {
            return;
        };
        self.members.remove(position);
        self.member_count.store(self.members.len(), Ordering::SeqCst);
        info!("Peer {peer_id} left room {}", self.id);

        self.broadcast(Message::remove_peer(peer_id.clone())).await;
    }

    async fn route(&mut self, message: Message) {
        match message.message_type {
            MessageType::Join => {
                let Some(joiner) = message.from else {
                    return;
                };
                let Some(position) = self.members.iter().position(|m| m == &joiner) else {
                    warn!("Join from unregistered peer {joiner}");
                    return;
                };
                // Everyone already present originates an offer toward the
                // newcomer; the newcomer itself only ever answers them.
                for member in self.members[..position].to_vec() {
                    self.signaling
                        .send_to(&member, Message::offer_request(joiner.clone()))
                        .await;
                }
            }
            MessageType::Negotiation => {
                let Some(to) = message.to.clone() else {
                    warn!("Dropping unaddressed negotiation message");
                    return;
                };
                self.signaling.send_to(&to, message).await;
            }
            MessageType::RemovePeer | MessageType::RoomClosed => {
                // Server-originated types; a client must not spoof them.
                warn!(
                    "Ignoring client-sent {:?} in room {}",
                    message.message_type, self.id
                );
            }
        }
    }

    async fn broadcast(&self, message: Message) {
        for member in &self.members {
            self.signaling.send_to(member, message.clone()).await;
        }
    }
}
