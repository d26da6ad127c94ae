use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use huddle_core::model::{RoomId, RoomInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

struct RoomEntry {
    command_tx: mpsc::Sender<RoomCommand>,
    member_count: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomEntry>>,
    signaling: Arc<dyn SignalingOutput>,
    idle_timeout: Duration,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>, idle_timeout: Duration) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            idle_timeout,
        }
    }

    /// Command sender for the room, spawning its event loop on first use.
    pub fn room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(entry) = self.rooms.get(room_id) {
            return entry.command_tx.clone();
        }

        info!("Creating room {room_id}");
        let (command_tx, command_rx) = mpsc::channel(100);
        let member_count = Arc::new(AtomicUsize::new(0));

        let room = Room::new(
            room_id.clone(),
            command_rx,
            self.signaling.clone(),
            self.idle_timeout,
            member_count.clone(),
        );
        let rooms = self.rooms.clone();
        let id = room_id.clone();
        tokio::spawn(async move {
            room.run().await;
            rooms.remove(&id);
        });

        self.rooms.insert(
            room_id.clone(),
            RoomEntry {
                command_tx: command_tx.clone(),
                member_count,
            },
        );
        command_tx
    }

    pub fn list(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .map(|entry| RoomInfo {
                id: entry.key().clone(),
                member_count: entry.value().member_count.load(Ordering::SeqCst),
            })
            .collect()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Force-close a room; members still inside receive `RoomClosed`.
    pub async fn close_room(&self, room_id: &RoomId) {
        if let Some(entry) = self.rooms.get(room_id) {
            let _ = entry.command_tx.send(RoomCommand::Shutdown).await;
        }
    }
}
