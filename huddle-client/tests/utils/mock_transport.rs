use async_trait::async_trait;
use huddle_client::error::TransportError;
use huddle_client::media::{LocalStream, LocalTrack, StreamId, TrackId};
use huddle_client::transport::{MediaTransport, SenderId, TransportEvent, TransportFactory};
use huddle_core::model::{PeerId, SessionDescription};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Ordered log of transport calls, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SessionDescription),
    SetRemote(SessionDescription),
    AddCandidate(String),
    AddTrack { track: TrackId, stream: StreamId },
    RemoveTrack(SenderId),
    SendControl(String),
    Close,
}

/// MediaTransport double: records every call, answers with canned
/// descriptions, and lets the test inject transport events.
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    event_tx: mpsc::Sender<TransportEvent>,
    next_sender: AtomicU64,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<TransportEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let transport = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            event_tx,
            next_sender: AtomicU64::new(0),
        });
        (transport, event_rx)
    }

    pub async fn push_event(&self, event: TransportEvent) {
        self.event_tx
            .send(event)
            .await
            .expect("engine dropped its transport event stream");
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matcher(c)).count()
    }

    pub fn candidates(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                TransportCall::AddCandidate(candidate) => Some(candidate.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        self.record(TransportCall::CreateOffer);
        Ok(SessionDescription::offer("v=0 mock-offer"))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        self.record(TransportCall::CreateAnswer);
        Ok(SessionDescription::answer("v=0 mock-answer"))
    }

    async fn set_local_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::SetLocal(desc.clone()));
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::SetRemote(desc.clone()));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &str) -> Result<(), TransportError> {
        self.record(TransportCall::AddCandidate(candidate.to_owned()));
        Ok(())
    }

    async fn add_track(
        &self,
        track: &LocalTrack,
        stream: &LocalStream,
    ) -> Result<SenderId, TransportError> {
        self.record(TransportCall::AddTrack {
            track: track.id.clone(),
            stream: stream.id.clone(),
        });
        Ok(SenderId(self.next_sender.fetch_add(1, Ordering::Relaxed)))
    }

    async fn remove_track(&self, sender: SenderId) -> Result<(), TransportError> {
        self.record(TransportCall::RemoveTrack(sender));
        Ok(())
    }

    async fn send_control(&self, token: &str) -> Result<(), TransportError> {
        self.record(TransportCall::SendControl(token.to_owned()));
        Ok(())
    }

    async fn close(&self) {
        self.record(TransportCall::Close);
    }
}

/// Factory handing out one [`MockTransport`] per peer, retrievable later
/// for assertions.
pub struct MockTransportFactory {
    transports: Mutex<HashMap<PeerId, Arc<MockTransport>>>,
}

impl MockTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            transports: Mutex::new(HashMap::new()),
        })
    }

    pub fn transport_for(&self, peer: &PeerId) -> Arc<MockTransport> {
        self.transports
            .lock()
            .unwrap()
            .get(peer)
            .expect("no transport created for peer")
            .clone()
    }

    pub fn created(&self) -> usize {
        self.transports.lock().unwrap().len()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create_transport(
        &self,
        peer_id: &PeerId,
    ) -> Result<(Arc<dyn MediaTransport>, mpsc::Receiver<TransportEvent>), TransportError> {
        let (transport, event_rx) = MockTransport::new();
        self.transports
            .lock()
            .unwrap()
            .insert(peer_id.clone(), transport.clone());
        Ok((transport as Arc<dyn MediaTransport>, event_rx))
    }
}
