//! HTTP handlers for the room directory REST surface (§6). These wrap C7
//! directly; the WebSocket route (`ws::handler`) is where a room actually
//! becomes live and starts accepting game actions.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub creator_id: Uuid,
    pub name: String,
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> AppResult<Json<Value>> {
    let room_id = state.directory.create_room(req.creator_id, &req.name).await?;
    Ok(Json(json!({
        "status": "ok",
        "room_id": room_id,
        "player_count": 0,
        "max_players": 4,
        "players": [],
    })))
}

pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<String>) -> AppResult<Json<Value>> {
    let record = state
        .directory
        .get_room(&room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("room not found".into()))?;

    Ok(Json(json!({
        "status": "ok",
        "room_id": record.room_code,
        "player_count": record.players.len(),
        "max_players": record.max_players,
        "players": record.players,
    })))
}

pub async fn list_rooms(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let rooms = state.directory.list_rooms().await?;
    let rooms: Vec<Value> = rooms
        .iter()
        .map(|r| {
            json!({
                "room_id": r.room_code,
                "player_count": r.players.len(),
                "max_players": r.max_players,
                "has_started": r.has_started,
            })
        })
        .collect();
    Ok(Json(json!({ "status": "ok", "rooms": rooms })))
}

pub async fn health() -> &'static str {
    "OK"
}
