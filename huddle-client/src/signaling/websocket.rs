use crate::error::ChannelError;
use crate::signaling::{ChannelEvent, SignalingChannel};
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use huddle_core::model::{Message, RoomId};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, tungstenite::Message>;

/// Signaling channel bound to a relay websocket (`/rooms/{room_id}/ws`).
pub struct WebsocketSignalingChannel {
    url: String,
    sink: Mutex<Option<WsSink>>,
}

impl WebsocketSignalingChannel {
    pub fn new(base_url: &str, room_id: &RoomId) -> Self {
        Self::from_url(format!("{base_url}/rooms/{room_id}/ws"))
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sink: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SignalingChannel for WebsocketSignalingChannel {
    async fn init(&self) -> Result<mpsc::Receiver<ChannelEvent>, ChannelError> {
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        let (sink, mut stream) = socket.split();
        *self.sink.lock().await = Some(sink);

        let (event_tx, event_rx) = mpsc::channel(256);
        let _ = event_tx.send(ChannelEvent::Open).await;

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(tungstenite::Message::Text(text)) => {
                        match serde_json::from_str::<Message>(&text) {
                            Ok(message) => {
                                if event_tx.send(ChannelEvent::Message(message)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Malformed payloads are dropped, never fatal.
                                warn!("Dropping undecodable signaling message: {e}");
                                let _ = event_tx.send(ChannelEvent::Error(e.to_string())).await;
                            }
                        }
                    }
                    Ok(tungstenite::Message::Close(_)) => {
                        let _ = event_tx.send(ChannelEvent::Closed).await;
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = event_tx.send(ChannelEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            debug!("Signaling read task finished");
        });

        Ok(event_rx)
    }

    async fn send_message(&self, message: &Message) -> Result<(), ChannelError> {
        let json = serde_json::to_string(message)?;
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ChannelError::NotConnected)?;
        sink.send(tungstenite::Message::Text(json))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn close(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
    }
}
