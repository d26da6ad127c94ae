use crate::error::ChannelError;
use async_trait::async_trait;
use huddle_core::model::Message;
use tokio::sync::mpsc;

/// Lifecycle and delivery events of a signaling channel.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The transport is ready to carry messages.
    Open,
    /// A decoded inbound envelope.
    Message(Message),
    /// A transport fault or an undecodable inbound payload. The faulty
    /// payload is dropped; the channel itself stays up where possible.
    Error(String),
    /// The transport went away.
    Closed,
}

/// Bidirectional message transport to the relay. Delivery order per
/// channel is preserved; nothing is guaranteed across peers.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Establish the underlying transport and return its event stream.
    /// The channel reports [`ChannelEvent::Open`] once it can carry
    /// messages.
    async fn init(&self) -> Result<mpsc::Receiver<ChannelEvent>, ChannelError>;

    /// Best-effort asynchronous send. No delivery confirmation.
    async fn send_message(&self, message: &Message) -> Result<(), ChannelError>;

    /// Release the transport. Idempotent.
    async fn close(&self);
}

/// Narrow outbound seam handed to negotiation engines, so they can emit
/// envelopes without owning the channel lifecycle.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_message(&self, message: Message);
}
