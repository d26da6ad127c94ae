use crate::engine::{EngineCommand, EngineEvent};
use crate::media::{LocalStream, StreamId, StreamKind, TrackId};
use crate::signaling::SignalingOutput;
use crate::transport::{MediaTransport, SenderId, TransportEvent};
use huddle_core::model::{Message, PeerId, SdpKind, SessionDescription, SignalPayload};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) const MUTE_TOKEN: &str = "muteaudio";
pub(crate) const UNMUTE_TOKEN: &str = "unmuteaudio";

/// Offer/answer round-trip state. `Offering` and `Answering` both count
/// as negotiating for the single-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NegotiationState {
    Idle,
    Offering,
    Answering,
}

/// One inbound stream and the classification it was announced with.
struct RemoteStream {
    id: StreamId,
    kind: StreamKind,
    tracks: HashSet<TrackId>,
}

/// Clonable handle the session keeps in its connection registry.
#[derive(Clone)]
pub struct EngineHandle {
    peer_id: PeerId,
    command_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub async fn send(&self, command: EngineCommand) {
        if self.command_tx.send(command).await.is_err() {
            debug!("Engine for {} is gone, command dropped", self.peer_id);
        }
    }
}

/// Per-remote-peer negotiation state machine. Owns one transport, drives
/// the offer/answer and candidate exchange for that peer, tracks inbound
/// streams, and carries the mute control sub-channel. Runs as a single
/// task, so no two transitions ever interleave.
pub struct NegotiationEngine {
    peer_id: PeerId,
    transport: Arc<dyn MediaTransport>,
    signaling: Arc<dyn SignalingOutput>,
    events: mpsc::Sender<EngineEvent>,
    command_rx: mpsc::Receiver<EngineCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    state: NegotiationState,
    have_remote_description: bool,
    pending_candidates: Vec<String>,
    remote_streams: Vec<RemoteStream>,
    streams_seen: usize,
    senders: HashMap<(TrackId, StreamId), SenderId>,
    audio_muted: bool,
}

impl NegotiationEngine {
    pub fn new(
        peer_id: PeerId,
        transport: Arc<dyn MediaTransport>,
        transport_rx: mpsc::Receiver<TransportEvent>,
        signaling: Arc<dyn SignalingOutput>,
        events: mpsc::Sender<EngineEvent>,
        audio_muted: bool,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let handle = EngineHandle {
            peer_id: peer_id.clone(),
            command_tx,
        };
        let engine = Self {
            peer_id,
            transport,
            signaling,
            events,
            command_rx,
            transport_rx,
            state: NegotiationState::Idle,
            have_remote_description: false,
            pending_candidates: Vec::new(),
            remote_streams: Vec::new(),
            streams_seen: 0,
            senders: HashMap::new(),
            audio_muted,
        };
        (engine, handle)
    }

    pub async fn run(mut self) {
        info!("Negotiation engine for {} started", self.peer_id);

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(EngineCommand::Close) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                event = self.transport_rx.recv() => {
                    match event {
                        Some(event) => self.handle_transport_event(event).await,
                        None => break,
                    }
                }
            }
        }

        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        // Announce the end of every live remote stream before going away.
        for remote in std::mem::take(&mut self.remote_streams) {
            self.emit(EngineEvent::StreamRemoved {
                peer: self.peer_id.clone(),
                stream: remote.id,
                kind: remote.kind,
            })
            .await;
        }
        self.transport.close().await;
        self.emit(EngineEvent::Closed {
            peer: self.peer_id.clone(),
        })
        .await;
        info!("Negotiation engine for {} finished", self.peer_id);
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Negotiation(payload) => self.handle_negotiation(payload).await,
            EngineCommand::AddStream(stream) => self.add_stream(&stream).await,
            EngineCommand::RemoveStream(stream) => self.remove_stream(&stream).await,
            EngineCommand::SetMuted(muted) => self.set_muted(muted).await,
            // Handled by the run loop.
            EngineCommand::Close => {}
        }
    }

    async fn handle_negotiation(&mut self, payload: Option<SignalPayload>) {
        match payload {
            None => self.originate_offer().await,
            Some(SignalPayload::Sdp { sdp }) => {
                match serde_json::from_str::<SessionDescription>(&sdp) {
                    Ok(desc) if desc.kind == SdpKind::Offer => self.accept_offer(desc).await,
                    Ok(desc) => self.accept_answer(desc).await,
                    Err(e) => {
                        warn!("Dropping undecodable description from {}: {e}", self.peer_id)
                    }
                }
            }
            Some(SignalPayload::Candidate { candidate }) => self.accept_candidate(candidate).await,
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::NegotiationNeeded => self.originate_offer().await,
            TransportEvent::CandidateGathered(candidate) => {
                self.signaling
                    .send_message(Message::candidate(self.peer_id.clone(), candidate))
                    .await;
            }
            TransportEvent::TrackAdded { stream, track } => self.track_added(stream, track).await,
            TransportEvent::TrackEnded { stream, track } => self.track_ended(&stream, &track).await,
            TransportEvent::ControlOpen => {
                // A late joiner's UI must reflect the current mute state.
                if self.audio_muted {
                    self.send_control(MUTE_TOKEN).await;
                }
            }
            TransportEvent::ControlMessage(token) => self.control_message(&token).await,
            TransportEvent::ConnectionState(state) => {
                self.emit(EngineEvent::ConnectionChanged {
                    peer: self.peer_id.clone(),
                    state,
                })
                .await;
            }
            TransportEvent::SignalingStable => {
                // The transport's view wins if our bookkeeping drifted.
                self.state = NegotiationState::Idle;
            }
        }
    }

    /// Start a local offer round. Coalesced while another round is in
    /// flight: the transport re-raises the need once the state is stable
    /// again if the descriptions are still out of sync.
    async fn originate_offer(&mut self) {
        if self.state != NegotiationState::Idle {
            debug!("Offer toward {} coalesced, negotiation in flight", self.peer_id);
            return;
        }
        self.state = NegotiationState::Offering;

        let offer = match self.transport.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                warn!("Failed to create offer for {}: {e}", self.peer_id);
                self.state = NegotiationState::Idle;
                return;
            }
        };
        if let Err(e) = self.transport.set_local_description(&offer).await {
            warn!("Failed to apply local offer for {}: {e}", self.peer_id);
            self.state = NegotiationState::Idle;
            return;
        }
        self.send_description(&offer).await;
    }

    /// Accepting a remote offer is how an in-flight round gets resolved;
    /// there is no single-flight check on this path.
    async fn accept_offer(&mut self, offer: SessionDescription) {
        self.state = NegotiationState::Answering;

        if let Err(e) = self.transport.set_remote_description(&offer).await {
            warn!("Failed to apply offer from {}: {e}", self.peer_id);
            self.state = NegotiationState::Idle;
            return;
        }
        self.have_remote_description = true;
        self.flush_pending_candidates().await;

        let answer = match self.transport.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Failed to create answer for {}: {e}", self.peer_id);
                self.state = NegotiationState::Idle;
                return;
            }
        };
        if let Err(e) = self.transport.set_local_description(&answer).await {
            warn!("Failed to apply local answer for {}: {e}", self.peer_id);
            self.state = NegotiationState::Idle;
            return;
        }
        self.send_description(&answer).await;
        self.state = NegotiationState::Idle;
    }

    /// A stale or duplicate answer (no outstanding local offer) is
    /// recoverable: ignore and continue.
    async fn accept_answer(&mut self, answer: SessionDescription) {
        if self.state != NegotiationState::Offering {
            debug!("Ignoring answer from {} with no outstanding offer", self.peer_id);
            return;
        }
        if let Err(e) = self.transport.set_remote_description(&answer).await {
            warn!("Failed to apply answer from {}: {e}", self.peer_id);
            self.state = NegotiationState::Idle;
            return;
        }
        self.have_remote_description = true;
        self.state = NegotiationState::Idle;
        self.flush_pending_candidates().await;
    }

    async fn accept_candidate(&mut self, candidate: String) {
        if !self.have_remote_description {
            self.pending_candidates.push(candidate);
            return;
        }
        if let Err(e) = self.transport.add_ice_candidate(&candidate).await {
            warn!("Failed to apply candidate from {}: {e}", self.peer_id);
        }
    }

    /// Apply buffered candidates in arrival order. The buffer drains
    /// exactly once; candidates arriving after a remote description exists
    /// never touch it.
    async fn flush_pending_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(&candidate).await {
                warn!(
                    "Failed to apply buffered candidate from {}: {e}",
                    self.peer_id
                );
            }
        }
    }

    async fn send_description(&self, desc: &SessionDescription) {
        match serde_json::to_string(desc) {
            Ok(blob) => {
                self.signaling
                    .send_message(Message::sdp(self.peer_id.clone(), blob))
                    .await;
            }
            Err(e) => warn!("Failed to serialize description for {}: {e}", self.peer_id),
        }
    }

    async fn track_added(&mut self, stream: StreamId, track: TrackId) {
        if let Some(remote) = self.remote_streams.iter_mut().find(|r| r.id == stream) {
            // Known stream id: just record the extra track.
            remote.tracks.insert(track);
            return;
        }

        let kind = if self.streams_seen == 0 {
            StreamKind::Video
        } else {
            StreamKind::Screen
        };
        self.streams_seen += 1;
        self.remote_streams.push(RemoteStream {
            id: stream.clone(),
            kind,
            tracks: HashSet::from([track]),
        });
        self.emit(EngineEvent::StreamAdded {
            peer: self.peer_id.clone(),
            stream,
            kind,
        })
        .await;
    }

    async fn track_ended(&mut self, stream: &StreamId, track: &TrackId) {
        let Some(position) = self.remote_streams.iter().position(|r| &r.id == stream) else {
            return;
        };
        self.remote_streams[position].tracks.remove(track);
        if self.remote_streams[position].tracks.is_empty() {
            let remote = self.remote_streams.remove(position);
            self.emit(EngineEvent::StreamRemoved {
                peer: self.peer_id.clone(),
                stream: remote.id,
                kind: remote.kind,
            })
            .await;
        }
    }

    async fn control_message(&mut self, token: &str) {
        match token {
            MUTE_TOKEN => {
                self.emit(EngineEvent::Muted {
                    peer: self.peer_id.clone(),
                })
                .await;
            }
            UNMUTE_TOKEN => {
                self.emit(EngineEvent::Unmuted {
                    peer: self.peer_id.clone(),
                })
                .await;
            }
            other => debug!("Unhandled control token from {}: {other:?}", self.peer_id),
        }
    }

    async fn set_muted(&mut self, muted: bool) {
        self.audio_muted = muted;
        self.send_control(if muted { MUTE_TOKEN } else { UNMUTE_TOKEN })
            .await;
    }

    async fn send_control(&self, token: &str) {
        if let Err(e) = self.transport.send_control(token).await {
            warn!("Failed to send control token to {}: {e}", self.peer_id);
        }
    }

    async fn add_stream(&mut self, stream: &LocalStream) {
        for track in &stream.tracks {
            let key = (track.id.clone(), stream.id.clone());
            if self.senders.contains_key(&key) {
                continue;
            }
            match self.transport.add_track(track, stream).await {
                Ok(sender) => {
                    self.senders.insert(key, sender);
                }
                Err(e) => warn!(
                    "Failed to attach track {} for {}: {e}",
                    track.id, self.peer_id
                ),
            }
        }
    }

    async fn remove_stream(&mut self, stream: &LocalStream) {
        for track in &stream.tracks {
            let Some(sender) = self.senders.remove(&(track.id.clone(), stream.id.clone())) else {
                continue;
            };
            if let Err(e) = self.transport.remove_track(sender).await {
                warn!(
                    "Failed to detach track {} for {}: {e}",
                    track.id, self.peer_id
                );
            }
        }
    }

    async fn emit(&self, event: EngineEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Session event channel closed");
        }
    }
}
