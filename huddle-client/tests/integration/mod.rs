
use crate::utils::{
    MockSignalingChannel, MockSignalingOutput, MockTransport, MockTransportFactory, init_tracing,
    wait_until,
};
use huddle_client::engine::{EngineEvent, EngineHandle, NegotiationEngine};
use huddle_client::error::ClientError;
use huddle_client::media::{LocalStream, LocalTrack};
use huddle_client::session::{Session, SessionEvent, SessionHandle};
use huddle_client::signaling::{ChannelEvent, SignalingChannel, SignalingOutput};
use huddle_client::transport::{MediaTransport, TransportFactory};
use huddle_core::model::{Message, PeerId, SessionDescription, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct TestEngine {
    pub handle: EngineHandle,
    pub transport: Arc<MockTransport>,
    pub events: mpsc::Receiver<EngineEvent>,
    pub outbound: mpsc::UnboundedReceiver<Message>,
}

/// Spawn an engine wired to a mock transport and a captured signaling
/// output.
pub fn create_test_engine(peer: &str, audio_muted: bool) -> TestEngine {
    init_tracing();

    let (transport, transport_rx) = MockTransport::new();
    let (signaling, outbound) = MockSignalingOutput::new();
    let (events_tx, events) = mpsc::channel(64);

    let (engine, handle) = NegotiationEngine::new(
        PeerId::from(peer),
        transport.clone() as Arc<dyn MediaTransport>,
        transport_rx,
        signaling as Arc<dyn SignalingOutput>,
        events_tx,
        audio_muted,
    );
    tokio::spawn(engine.run());

    TestEngine {
        handle,
        transport,
        events,
        outbound,
    }
}

pub struct TestSession {
    pub handle: SessionHandle,
    pub channel: Arc<MockSignalingChannel>,
    pub factory: Arc<MockTransportFactory>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub task: tokio::task::JoinHandle<Result<(), ClientError>>,
}

pub fn camera_stream() -> LocalStream {
    LocalStream::new(
        "local-camera",
        vec![LocalTrack::audio("mic"), LocalTrack::video("cam")],
    )
}

pub fn screen_stream() -> LocalStream {
    LocalStream::new("local-screen", vec![LocalTrack::video("screen-video")])
}

/// Spawn a session over mock channel and transports, opened and joined.
pub async fn create_test_session() -> TestSession {
    init_tracing();

    let channel = MockSignalingChannel::new();
    let factory = MockTransportFactory::new();
    let (session, handle, events) = Session::new(
        channel.clone() as Arc<dyn SignalingChannel>,
        factory.clone() as Arc<dyn TransportFactory>,
        camera_stream(),
    );
    let task = tokio::spawn(session.run());

    channel.push(ChannelEvent::Open).await;
    let joined = channel.clone();
    wait_until(move || joined.sent_count() == 1).await;

    TestSession {
        handle,
        channel,
        factory,
        events,
        task,
    }
}

pub fn offer_blob() -> String {
    serde_json::to_string(&SessionDescription::offer("v=0 remote-offer")).unwrap()
}

pub fn answer_blob() -> String {
    serde_json::to_string(&SessionDescription::answer("v=0 remote-answer")).unwrap()
}

pub fn sdp_payload(blob: String) -> Option<SignalPayload> {
    Some(SignalPayload::Sdp { sdp: blob })
}

pub fn candidate_payload(candidate: &str) -> Option<SignalPayload> {
    Some(SignalPayload::Candidate {
        candidate: candidate.to_owned(),
    })
}
