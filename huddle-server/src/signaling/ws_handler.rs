use crate::http::AppState;
use crate::room::RoomCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::model::{Message, PeerId, RoomId};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let peer_id = PeerId::random();
    let room_tx = state.rooms.room_sender(&RoomId::from(room_id));

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, room_tx, state.signaling))
}

async fn handle_socket(
    socket: WebSocket,
    peer_id: PeerId,
    room_tx: mpsc::Sender<RoomCommand>,
    service: SignalingService,
) {
    info!("New WebSocket connection: {peer_id}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(peer_id.clone(), tx);
    let _ = room_tx
        .send(RoomCommand::Register {
            peer_id: peer_id.clone(),
        })
        .await;

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let room_tx = room_tx.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    WsMessage::Text(text) => match serde_json::from_str::<Message>(&text) {
                        Ok(mut message) => {
                            // The relay, never the sender, is authoritative
                            // for the origin id.
                            message.from = Some(peer_id.clone());
                            if room_tx.send(RoomCommand::Inbound { message }).await.is_err() {
                                error!("Room died");
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid message from {peer_id}: {e:?}"),
                    },
                    WsMessage::Close(_) => break,
                    _ => {}
                }
            }

            let _ = room_tx
                .send(RoomCommand::Unregister {
                    peer_id: peer_id.clone(),
                })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&peer_id);
    info!("WebSocket disconnected: {peer_id}");
}
