//! Client side of a huddle room: one [`session::Session`] per joined room,
//! one [`engine::NegotiationEngine`] per remote peer, driven entirely by
//! typed events. The session task is spawned by the caller:
//!
//! ```ignore
//! let (session, handle, mut events) = Session::new(channel, transports, camera);
//! tokio::spawn(session.run());
//! ```

pub mod engine;
pub mod error;
pub mod media;
pub mod session;
pub mod signaling;
pub mod transport;

pub use error::{ChannelError, ClientError, TransportError};
pub use session::{Session, SessionEvent, SessionHandle};
