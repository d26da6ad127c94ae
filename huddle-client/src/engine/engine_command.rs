use crate::media::LocalStream;
use huddle_core::model::SignalPayload;

/// Commands from the owning session into a per-peer engine.
#[derive(Debug)]
pub enum EngineCommand {
    /// Inbound `Negotiation` payload routed by the session. `None` is the
    /// relay's request to originate an offer.
    Negotiation(Option<SignalPayload>),

    /// Attach every track of the stream (idempotent per track+stream
    /// pair).
    AddStream(LocalStream),

    /// Detach every track of the stream.
    RemoveStream(LocalStream),

    /// Push the local mute state over the control sub-channel.
    SetMuted(bool),

    /// Close the transport and finish the engine task.
    Close,
}
