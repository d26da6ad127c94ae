use crate::room::RoomManager;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use huddle_core::model::{RoomId, RoomInfo};
use serde_json::{Value, json};

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomManager,
    pub signaling: SignalingService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{room_id}", delete(close_room))
        .route("/rooms/{room_id}/ws", get(ws_handler))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomInfo>> {
    Json(state.rooms.list())
}

async fn create_room(State(state): State<AppState>) -> Json<RoomInfo> {
    let id = RoomId::new();
    state.rooms.room_sender(&id);
    Json(RoomInfo {
        id,
        member_count: 0,
    })
}

/// Force-close a room; members still inside are told it is gone.
async fn close_room(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> StatusCode {
    let room_id = RoomId::from(room_id);
    if !state.rooms.contains(&room_id) {
        return StatusCode::NOT_FOUND;
    }
    state.rooms.close_room(&room_id).await;
    StatusCode::NO_CONTENT
}
