//! Route definitions (§6 HTTP surface + the WebSocket upgrade route).

use axum::{
    routing::{get, post},
    Router,
};

use super::{handlers, AppState};
use crate::ws;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/room/create", post(handlers::create_room))
        .route("/api/room/:room_id", get(handlers::get_room))
        .route("/api/rooms", get(handlers::list_rooms))
        .route("/ws/:room_code", get(ws::handler))
}
