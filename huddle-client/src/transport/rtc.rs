use crate::error::TransportError;
use crate::media::{LocalStream, LocalTrack, StreamId, TrackId, TrackKind};
use crate::transport::capability::{
    ConnectionState, MediaTransport, SenderId, TransportEvent, TransportFactory,
};
use async_trait::async_trait;
use huddle_core::model::{PeerId, SdpKind, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Configuration for the real-time transport.
#[derive(Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun1.l.google.com:19302".to_owned()],
        }
    }
}

pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create_transport(
        &self,
        peer_id: &PeerId,
    ) -> Result<(Arc<dyn MediaTransport>, mpsc::Receiver<TransportEvent>), TransportError> {
        let (transport, events) =
            RtcMediaTransport::new(peer_id.clone(), self.config.clone()).await?;
        Ok((transport, events))
    }
}

/// [`MediaTransport`] backed by a webrtc-rs peer connection. Transport
/// callbacks are forwarded into the event channel handed out at creation.
pub struct RtcMediaTransport {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    control: Arc<RTCDataChannel>,
    senders: Mutex<HashMap<SenderId, Arc<RTCRtpSender>>>,
    local_tracks: Mutex<HashMap<TrackId, Arc<TrackLocalStaticSample>>>,
    next_sender: AtomicU64,
}

impl RtcMediaTransport {
    pub async fn new(
        peer_id: PeerId,
        config: TransportConfig,
    ) -> Result<(Arc<Self>, mpsc::Receiver<TransportEvent>), TransportError> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;
        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let (event_tx, event_rx) = mpsc::channel(256);

        register_callbacks(&peer_connection, &peer_id, &event_tx);
        let control = setup_control_channel(&peer_connection, &peer_id, &event_tx).await?;

        let transport = Arc::new(Self {
            peer_id,
            peer_connection,
            control,
            senders: Mutex::new(HashMap::new()),
            local_tracks: Mutex::new(HashMap::new()),
            next_sender: AtomicU64::new(0),
        });
        Ok((transport, event_rx))
    }

    /// Writable handle for a local track, used by the capture adapter to
    /// feed samples into the connection.
    pub async fn sample_track(&self, id: &TrackId) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl MediaTransport for RtcMediaTransport {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: &SessionDescription,
    ) -> Result<(), TransportError> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &str) -> Result<(), TransportError> {
        let init: RTCIceCandidateInit =
            serde_json::from_str(candidate).map_err(TransportError::BadCandidate)?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn add_track(
        &self,
        track: &LocalTrack,
        stream: &LocalStream,
    ) -> Result<SenderId, TransportError> {
        let local = {
            let mut tracks = self.local_tracks.lock().await;
            tracks
                .entry(track.id.clone())
                .or_insert_with(|| {
                    Arc::new(TrackLocalStaticSample::new(
                        codec_for(track.kind),
                        track.id.to_string(),
                        stream.id.to_string(),
                    ))
                })
                .clone()
        };

        let sender = self
            .peer_connection
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;
        let id = SenderId(self.next_sender.fetch_add(1, Ordering::Relaxed));
        self.senders.lock().await.insert(id, sender);
        debug!("Attached track {} toward {}", track.id, self.peer_id);
        Ok(id)
    }

    async fn remove_track(&self, sender: SenderId) -> Result<(), TransportError> {
        let Some(sender) = self.senders.lock().await.remove(&sender) else {
            return Ok(());
        };
        self.peer_connection.remove_track(&sender).await?;
        Ok(())
    }

    async fn send_control(&self, token: &str) -> Result<(), TransportError> {
        if self.control.ready_state() != RTCDataChannelState::Open {
            return Err(TransportError::ControlClosed);
        }
        self.control.send_text(token.to_owned()).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.control.close().await {
            debug!("Control channel close for {}: {e}", self.peer_id);
        }
        if let Err(e) = self.peer_connection.close().await {
            debug!("Peer connection close for {}: {e}", self.peer_id);
        }
    }
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    let mime_type = match kind {
        TrackKind::Audio => MIME_TYPE_OPUS,
        TrackKind::Video => MIME_TYPE_VP8,
    };
    RTCRtpCodecCapability {
        mime_type: mime_type.to_owned(),
        ..Default::default()
    }
}

fn to_rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription, TransportError> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp.clone())?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp.clone())?,
    };
    Ok(rtc)
}

fn map_connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
        _ => ConnectionState::New,
    }
}

fn register_callbacks(
    peer_connection: &Arc<RTCPeerConnection>,
    peer_id: &PeerId,
    event_tx: &mpsc::Sender<TransportEvent>,
) {
    let state_tx = event_tx.clone();
    let state_peer = peer_id.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let peer = state_peer.clone();
            Box::pin(async move {
                info!("Connection state for {peer}: {s:?}");
                let _ = tx
                    .send(TransportEvent::ConnectionState(map_connection_state(s)))
                    .await;
            })
        },
    ));

    let signaling_tx = event_tx.clone();
    peer_connection.on_signaling_state_change(Box::new(move |s: RTCSignalingState| {
        let tx = signaling_tx.clone();
        Box::pin(async move {
            if s == RTCSignalingState::Stable {
                let _ = tx.send(TransportEvent::SignalingStable).await;
            }
        })
    }));

    let negotiation_tx = event_tx.clone();
    peer_connection.on_negotiation_needed(Box::new(move || {
        let tx = negotiation_tx.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::NegotiationNeeded).await;
        })
    }));

    // Trickle ICE: every gathered candidate goes out through the relay.
    let ice_tx = event_tx.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();
        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(json_candidate) = candidate.to_json() else {
                return;
            };
            let Ok(blob) = serde_json::to_string(&json_candidate) else {
                return;
            };
            let _ = tx.send(TransportEvent::CandidateGathered(blob)).await;
        })
    }));

    let track_tx = event_tx.clone();
    peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
        let tx = track_tx.clone();
        Box::pin(async move {
            let stream = StreamId::from(track.stream_id());
            let track_id = TrackId::from(track.id());
            debug!("Remote track {track_id} on stream {stream}");
            let _ = tx
                .send(TransportEvent::TrackAdded {
                    stream: stream.clone(),
                    track: track_id.clone(),
                })
                .await;

            // Drain the track; EOF is how the transport reports track end.
            tokio::spawn(async move {
                while track.read_rtp().await.is_ok() {}
                let _ = tx
                    .send(TransportEvent::TrackEnded {
                        stream,
                        track: track_id,
                    })
                    .await;
            });
        })
    }));

    // The peer's own control channel; both ends stay functionally
    // equivalent, so inbound tokens are accepted from either channel.
    let dc_tx = event_tx.clone();
    peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
        let tx = dc_tx.clone();
        Box::pin(async move {
            debug!("Accepted control channel '{}'", dc.label());
            attach_control_messages(&dc, tx);
        })
    }));
}

async fn setup_control_channel(
    peer_connection: &Arc<RTCPeerConnection>,
    peer_id: &PeerId,
    event_tx: &mpsc::Sender<TransportEvent>,
) -> Result<Arc<RTCDataChannel>, TransportError> {
    let control = peer_connection
        .create_data_channel(peer_id.as_str(), None)
        .await?;

    let open_tx = event_tx.clone();
    control.on_open(Box::new(move || {
        let tx = open_tx.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::ControlOpen).await;
        })
    }));

    attach_control_messages(&control, event_tx.clone());
    Ok(control)
}

fn attach_control_messages(channel: &Arc<RTCDataChannel>, event_tx: mpsc::Sender<TransportEvent>) {
    channel.on_message(Box::new(move |message: DataChannelMessage| {
        let tx = event_tx.clone();
        Box::pin(async move {
            match String::from_utf8(message.data.to_vec()) {
                Ok(token) => {
                    let _ = tx.send(TransportEvent::ControlMessage(token)).await;
                }
                Err(_) => warn!("Dropping non-UTF-8 control payload"),
            }
        })
    }));
}
