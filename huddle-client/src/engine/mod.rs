mod engine;
mod engine_command;
mod engine_event;

pub use engine::{EngineHandle, NegotiationEngine};
pub use engine_command::EngineCommand;
pub use engine_event::EngineEvent;
