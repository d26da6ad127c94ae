pub mod mock_transport;

pub use event_helpers::*;
pub use mock_signaling::*;
pub use mock_transport::*;
