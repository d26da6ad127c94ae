use crate::engine::{EngineCommand, EngineEvent, EngineHandle, NegotiationEngine};
use crate::error::ClientError;
use crate::media::LocalStream;
use crate::session::{SessionCommand, SessionEvent, SessionHandle};
use crate::signaling::{ChannelEvent, SignalingChannel, SignalingOutput};
use crate::transport::TransportFactory;
use async_trait::async_trait;
use huddle_core::model::{Message, MessageType, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Best-effort outbound path the engines share; send failures surface as
/// logs, not negotiation failures — the relay may be gone while
/// established media paths stay up.
struct ChannelOutput {
    channel: Arc<dyn SignalingChannel>,
}

#[async_trait]
impl SignalingOutput for ChannelOutput {
    async fn send_message(&self, message: Message) {
        if let Err(e) = self.channel.send_message(&message).await {
            warn!("Failed to send signaling message: {e}");
        }
    }
}

/// Room-level coordinator: owns the signaling channel and the local media
/// snapshots, keeps one [`NegotiationEngine`] per remote peer, routes
/// inbound envelopes, and republishes engine events to the application.
pub struct Session {
    channel: Arc<dyn SignalingChannel>,
    transports: Arc<dyn TransportFactory>,
    output: Arc<dyn SignalingOutput>,
    camera: LocalStream,
    screen: Option<LocalStream>,
    audio_muted: bool,
    engines: HashMap<PeerId, EngineHandle>,
    engine_events_tx: mpsc::Sender<EngineEvent>,
    engine_events_rx: mpsc::Receiver<EngineEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    closing: bool,
}

impl Session {
    pub fn new(
        channel: Arc<dyn SignalingChannel>,
        transports: Arc<dyn TransportFactory>,
        camera: LocalStream,
    ) -> (
        Self,
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (engine_events_tx, engine_events_rx) = mpsc::channel(256);
        let (events, events_rx) = mpsc::unbounded_channel();
        let audio_muted = camera.audio_muted();
        let output = Arc::new(ChannelOutput {
            channel: channel.clone(),
        });

        let session = Self {
            channel,
            transports,
            output,
            camera,
            screen: None,
            audio_muted,
            engines: HashMap::new(),
            engine_events_tx,
            engine_events_rx,
            command_rx,
            events,
            closing: false,
        };
        (session, SessionHandle::new(command_tx), events_rx)
    }

    /// Join the room and process events until the session closes.
    pub async fn run(mut self) -> Result<(), ClientError> {
        let mut channel_rx = self.channel.init().await?;
        info!("Session started");

        loop {
            tokio::select! {
                event = channel_rx.recv() => {
                    match event {
                        Some(event) => {
                            if self.handle_channel_event(event).await {
                                break;
                            }
                        }
                        None => {
                            warn!("Signaling event stream ended");
                            break;
                        }
                    }
                }
                event = self.engine_events_rx.recv() => {
                    // Never `None`: the session keeps a sender alive.
                    if let Some(event) = event {
                        self.handle_engine_event(event);
                    }
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Close) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Returns true when the session must stop.
    async fn handle_channel_event(&mut self, event: ChannelEvent) -> bool {
        match event {
            ChannelEvent::Open => {
                debug!("Signaling channel open, joining room");
                if let Err(e) = self.channel.send_message(&Message::join()).await {
                    self.emit(SessionEvent::Error(e.to_string()));
                }
                false
            }
            ChannelEvent::Message(message) => self.route_message(message).await,
            ChannelEvent::Error(reason) => {
                // Relay trouble must not tear down established media paths.
                warn!("Signaling channel error: {reason}");
                self.emit(SessionEvent::Error(reason));
                false
            }
            ChannelEvent::Closed => {
                warn!("Signaling channel closed by the relay");
                self.emit(SessionEvent::Error("signaling channel closed".to_owned()));
                false
            }
        }
    }

    async fn route_message(&mut self, message: Message) -> bool {
        match message.message_type {
            MessageType::Negotiation => {
                let Some(from) = message.from else {
                    warn!("Dropping negotiation message without sender");
                    return false;
                };
                if let Some(engine) = self.engine_for(&from).await {
                    engine.send(EngineCommand::Negotiation(message.data)).await;
                }
                false
            }
            MessageType::RemovePeer => {
                let Some(peer) = message.from else {
                    warn!("Dropping RemovePeer without peer id");
                    return false;
                };
                self.remove_engine(&peer).await;
                false
            }
            MessageType::RoomClosed => {
                info!("Room closed by the relay");
                self.emit(SessionEvent::RoomClosed);
                true
            }
            MessageType::Join => {
                // Consumed by the relay; clients never receive it.
                debug!("Ignoring unexpected Join message");
                false
            }
        }
    }

    /// Existing engine for the peer, or a lazily created one that starts
    /// with the current local streams attached.
    async fn engine_for(&mut self, peer: &PeerId) -> Option<EngineHandle> {
        if let Some(handle) = self.engines.get(peer) {
            return Some(handle.clone());
        }

        info!("Connecting to {peer}");
        let (transport, transport_rx) = match self.transports.create_transport(peer).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Failed to create transport for {peer}: {e}");
                self.emit(SessionEvent::Error(e.to_string()));
                return None;
            }
        };

        let (engine, handle) = NegotiationEngine::new(
            peer.clone(),
            transport,
            transport_rx,
            self.output.clone(),
            self.engine_events_tx.clone(),
            self.audio_muted,
        );
        tokio::spawn(engine.run());

        handle
            .send(EngineCommand::AddStream(self.camera.clone()))
            .await;
        if let Some(screen) = &self.screen {
            handle.send(EngineCommand::AddStream(screen.clone())).await;
        }

        self.engines.insert(peer.clone(), handle.clone());
        self.emit_connect();
        Some(handle)
    }

    async fn remove_engine(&mut self, peer: &PeerId) {
        let Some(handle) = self.engines.remove(peer) else {
            debug!("RemovePeer for unknown peer {peer}");
            return;
        };
        info!("Closing connection to {peer}");
        // The registry change is announced once the engine reports
        // `Closed`, after its `StreamRemoved` events.
        handle.send(EngineCommand::Close).await;
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StreamAdded { peer, stream, kind } => {
                self.emit(SessionEvent::StreamAdded { peer, stream, kind });
            }
            EngineEvent::StreamRemoved { peer, stream, kind } => {
                self.emit(SessionEvent::StreamRemoved { peer, stream, kind });
            }
            EngineEvent::Muted { peer } => self.emit(SessionEvent::Muted(peer)),
            EngineEvent::Unmuted { peer } => self.emit(SessionEvent::Unmuted(peer)),
            EngineEvent::ConnectionChanged { peer, state } => {
                self.emit(SessionEvent::ConnectivityChanged { peer, state });
            }
            EngineEvent::Closed { peer } => {
                // Engines may also finish on their own when the transport
                // dies; drop a stale registry entry either way.
                self.engines.remove(&peer);
                if !self.closing {
                    self.emit_connect();
                }
            }
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::ShareScreen(stream) => {
                info!("Sharing screen stream {}", stream.id);
                self.screen = Some(stream.clone());
                for handle in self.engines.values() {
                    handle.send(EngineCommand::AddStream(stream.clone())).await;
                }
            }
            SessionCommand::StopScreenShare => {
                let Some(stream) = self.screen.take() else {
                    return;
                };
                info!("Stopping screen share {}", stream.id);
                for handle in self.engines.values() {
                    handle
                        .send(EngineCommand::RemoveStream(stream.clone()))
                        .await;
                }
            }
            SessionCommand::MuteAudio => self.set_muted(true).await,
            SessionCommand::UnmuteAudio => self.set_muted(false).await,
            // Handled by the run loop.
            SessionCommand::Close => {}
        }
    }

    async fn set_muted(&mut self, muted: bool) {
        self.audio_muted = muted;
        // Mute state travels peer-to-peer only; the relay sees nothing.
        for handle in self.engines.values() {
            handle.send(EngineCommand::SetMuted(muted)).await;
        }
    }

    async fn shutdown(&mut self) {
        self.closing = true;
        info!("Session closing");
        for (_, handle) in self.engines.drain() {
            handle.send(EngineCommand::Close).await;
        }
        self.channel.close().await;
    }

    fn emit_connect(&self) {
        self.emit(SessionEvent::Connect {
            peers: self.engines.keys().cloned().collect(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Application event receiver dropped");
        }
    }
}
