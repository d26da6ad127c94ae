pub mod http;
pub mod room;
pub mod signaling;

pub use http::{AppState, router};
pub use room::{Room, RoomCommand, RoomManager};
pub use signaling::{SignalingOutput, SignalingService};
