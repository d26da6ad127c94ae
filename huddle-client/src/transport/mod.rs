mod capability;
mod rtc;

pub use capability::{
    ConnectionState, MediaTransport, SenderId, TransportEvent, TransportFactory,
};
pub use rtc::{RtcMediaTransport, RtcTransportFactory, TransportConfig};
