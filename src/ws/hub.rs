//! Per-connection WebSocket handling: the admission handshake and the
//! forwarding loops that bridge a socket to its room actor (§4.6, §6).

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::api::AppState;
use crate::game::events::{ClientEvent, ServerEvent};

use super::room::{self, RoomCommand};

pub async fn handle_socket(socket: WebSocket, state: AppState, room_code: String) {
    let (mut sender, mut receiver) = socket.split();

    let player_id = match await_establish_connection(&mut receiver).await {
        Some(id) => id,
        None => return,
    };

    let handle = room::get_or_spawn(&state.registry, state.directory.clone(), &room_code).await;

    // The unknown-user check (§7 class 1) happens inside the room actor's
    // `handle_join`, alongside the rest of the admission checks that also
    // consult C7 — see `AdmissionError::UnknownUser`.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (reply_tx, reply_rx) = oneshot::channel();
    let joined = handle.command_tx.send(RoomCommand::Join { player_id, tx, reply: reply_tx });
    if joined.is_err() {
        reject(&mut sender, "room is no longer available").await;
        return;
    }

    match reply_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(admission_error)) => {
            reject(&mut sender, admission_error.reason()).await;
            return;
        }
        Err(_) => {
            reject(&mut sender, "room is no longer available").await;
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let msg = serde_json::to_string(&event).unwrap_or_default();
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let command_tx = handle.command_tx.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let Message::Text(text) = msg else { continue };
            let Ok(event) = serde_json::from_str::<ClientEvent>(&text) else { continue };
            if command_tx.send(RoomCommand::Message { player_id, event }).is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    let _ = handle.command_tx.send(RoomCommand::Disconnect { player_id });
    tracing::debug!(%player_id, room = %room_code, "connection closed");
}

async fn await_establish_connection(
    receiver: &mut (impl futures::Stream<Item = Result<Message, axum::Error>> + Unpin),
) -> Option<uuid::Uuid> {
    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };
        let Ok(ClientEvent::EstablishConnection { player_id }) = serde_json::from_str::<ClientEvent>(&text) else {
            continue;
        };
        return Some(player_id);
    }
    None
}

async fn reject(sender: &mut (impl futures::Sink<Message> + Unpin), reason: &str) {
    let event = ServerEvent::Rejection { reason: reason.to_string() };
    if let Ok(msg) = serde_json::to_string(&event) {
        let _ = sender.send(Message::Text(msg.into())).await;
    }
}
