//! WebSocket module: the per-connection handshake/forwarding loop (`hub`)
//! and the per-room serialized actor (`room`), together implementing C6.

mod hub;
mod room;

pub use room::{new_registry, RoomRegistry};

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};

use crate::api::AppState;

/// WebSocket handler - upgrades HTTP to WebSocket connection scoped to a room.
/// The player identifier is carried by the first `establish_connection`
/// message (§4.6), not the URL, so reconnects never need a fresh route.
pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| hub::handle_socket(socket, state, room_code))
}
