use huddle_core::model::{Message, PeerId};

/// Commands a room receives from the websocket layer (or the manager).
#[derive(Debug)]
pub enum RoomCommand {
    /// A websocket connected; membership order decides who is asked to
    /// originate offers later.
    Register { peer_id: PeerId },

    /// The websocket went away.
    Unregister { peer_id: PeerId },

    /// A decoded client envelope, `from` already stamped by the relay.
    Inbound { message: Message },

    /// Forced close: remaining members are told the room is gone.
    Shutdown,
}
