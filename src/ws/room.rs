//! The room actor (C6): one `tokio::task` per active room, serialized over
//! an `mpsc::UnboundedReceiver<RoomCommand>`. The task is the sole owner of
//! its `GameState` once a game starts — no `Mutex`/`RwLock` wraps it, per
//! the single-writer model in §5.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot, RwLock};
use uuid::Uuid;

use crate::db::{RoomDirectory, RosterMember};
use crate::game::events::{build_game_update, ClientEvent, RosterEntry, ServerEvent};
use crate::game::{engine, Player};

/// Reason a connection is rejected before it ever joins a room's broadcast
/// group (§7, admission errors).
#[derive(Debug, Clone)]
pub enum AdmissionError {
    RoomMissing,
    RoomFull,
    DuplicatePlayer,
    GameAlreadyStarted,
    UnknownUser,
    Transient,
}

impl AdmissionError {
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::RoomMissing => "room does not exist",
            AdmissionError::RoomFull => "room is full",
            AdmissionError::DuplicatePlayer => "player already in room",
            AdmissionError::GameAlreadyStarted => "game already started",
            AdmissionError::UnknownUser => "unknown user",
            AdmissionError::Transient => "room directory unavailable",
        }
    }
}

pub enum RoomCommand {
    Join {
        player_id: Uuid,
        tx: mpsc::UnboundedSender<ServerEvent>,
        reply: oneshot::Sender<Result<(), AdmissionError>>,
    },
    Message {
        player_id: Uuid,
        event: ClientEvent,
    },
    Disconnect {
        player_id: Uuid,
    },
}

#[derive(Clone)]
pub struct RoomHandle {
    pub command_tx: mpsc::UnboundedSender<RoomCommand>,
}

pub type RoomRegistry = Arc<RwLock<HashMap<String, RoomHandle>>>;

pub fn new_registry() -> RoomRegistry {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Looks up a running room actor, spawning one if this is the first
/// connection to reach it since process start. The registry lock is held
/// only across the lookup/insert, never across a suspension point inside
/// the room's own processing (§5).
pub async fn get_or_spawn(registry: &RoomRegistry, directory: RoomDirectory, room_code: &str) -> RoomHandle {
    if let Some(handle) = registry.read().await.get(room_code) {
        return handle.clone();
    }
    let mut guard = registry.write().await;
    if let Some(handle) = guard.get(room_code) {
        return handle.clone();
    }
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let handle = RoomHandle { command_tx };
    guard.insert(room_code.to_string(), handle.clone());
    drop(guard);

    let room_code = room_code.to_string();
    let registry = registry.clone();
    tokio::spawn(async move {
        run_room(room_code.clone(), directory, command_rx).await;
        registry.write().await.remove(&room_code);
    });
    handle
}

struct RoomActor {
    room_code: String,
    directory: RoomDirectory,
    roster: Vec<RosterEntry>,
    connections: HashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>,
    game: Option<crate::game::GameState>,
    last_snapshot: Option<serde_json::Value>,
}

async fn run_room(room_code: String, directory: RoomDirectory, mut command_rx: mpsc::UnboundedReceiver<RoomCommand>) {
    let mut actor = RoomActor {
        room_code,
        directory,
        roster: Vec::new(),
        connections: HashMap::new(),
        game: None,
        last_snapshot: None,
    };

    while let Some(command) = command_rx.recv().await {
        match command {
            RoomCommand::Join { player_id, tx, reply } => {
                let result = actor.handle_join(player_id, tx).await;
                let _ = reply.send(result);
            }
            RoomCommand::Message { player_id, event } => actor.handle_message(player_id, event).await,
            RoomCommand::Disconnect { player_id } => {
                if actor.handle_disconnect(player_id).await {
                    break;
                }
            }
        }
    }
}

impl RoomActor {
    /// Runs the §4.6 point-2 admission checks against C7, in spec order: room
    /// missing, already started, unknown user, duplicate player, room full.
    async fn handle_join(
        &mut self,
        player_id: Uuid,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), AdmissionError> {
        let record = match self.directory.get_room(&self.room_code).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(AdmissionError::RoomMissing),
            Err(_) => return Err(AdmissionError::Transient),
        };
        if record.has_started {
            return Err(AdmissionError::GameAlreadyStarted);
        }
        let user = match self.directory.get_user(player_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AdmissionError::UnknownUser),
            Err(_) => return Err(AdmissionError::Transient),
        };
        if record.players.iter().any(|p| p.id == player_id) || self.roster.iter().any(|p| p.id == player_id) {
            return Err(AdmissionError::DuplicatePlayer);
        }
        if record.players.len() as u32 >= record.max_players {
            return Err(AdmissionError::RoomFull);
        }

        let mut players = record.players;
        players.push(RosterMember { id: player_id, name: user.username.clone(), is_ready: false });
        let updated = crate::db::RoomRecord { players, ..record };
        if self.directory.update_room(updated).await.is_err() {
            return Err(AdmissionError::Transient);
        }

        self.roster.push(RosterEntry { id: player_id, name: user.username, is_ready: false });
        self.connections.insert(player_id, tx);
        self.broadcast_roster();
        Ok(())
    }

    async fn handle_disconnect(&mut self, player_id: Uuid) -> bool {
        self.connections.remove(&player_id);
        self.roster.retain(|p| p.id != player_id);
        if self.game.is_some() {
            self.broadcast(ServerEvent::PlayerDisconnected { player: player_id });
        }

        if let Ok(Some(record)) = self.directory.get_room(&self.room_code).await {
            let mut players = record.players;
            players.retain(|p| p.id != player_id);
            let empty = players.is_empty();
            let updated = crate::db::RoomRecord { players, ..record };
            let _ = self.directory.update_room(updated).await;
            if empty {
                let _ = self.directory.delete_room(&self.room_code).await;
                return true;
            }
        }
        self.broadcast_roster();
        false
    }

    async fn handle_message(&mut self, player_id: Uuid, event: ClientEvent) {
        match event {
            ClientEvent::EstablishConnection { .. } => {}
            ClientEvent::PlayerReady { is_ready } => self.handle_ready(player_id, is_ready).await,
            ClientEvent::StartGame => self.handle_start_game(player_id).await,
            ClientEvent::InitialGameState => self.send_initial_state(player_id),
            other => self.handle_action(player_id, other),
        }
    }

    async fn handle_ready(&mut self, player_id: Uuid, is_ready: bool) {
        if let Some(entry) = self.roster.iter_mut().find(|p| p.id == player_id) {
            entry.is_ready = is_ready;
        } else {
            return;
        }
        if let Ok(Some(record)) = self.directory.get_room(&self.room_code).await {
            let mut players = record.players;
            if let Some(p) = players.iter_mut().find(|p| p.id == player_id) {
                p.is_ready = is_ready;
            }
            let updated = crate::db::RoomRecord { players, ..record };
            let _ = self.directory.update_room(updated).await;
        }
        self.broadcast_roster();
    }

    async fn handle_start_game(&mut self, actor: Uuid) {
        if self.game.is_some() || self.roster.len() < 2 {
            return;
        }
        if !self.roster.iter().any(|p| p.id == actor) {
            return;
        }
        let mut players: Vec<Player> = self.roster.iter().map(|p| Player::new(p.id, p.name.clone())).collect();
        // §3: turn order is randomized at game start, independent of join order.
        players.shuffle(&mut rand::thread_rng());
        let game = engine::new_game(self.room_code.clone(), players, None);
        self.game = Some(game);

        if let Ok(Some(record)) = self.directory.get_room(&self.room_code).await {
            let updated = crate::db::RoomRecord { has_started: true, ..record };
            let _ = self.directory.update_room(updated).await;
        }

        self.broadcast(ServerEvent::GameStarted);
        self.broadcast_game_update();
    }

    fn send_initial_state(&mut self, player_id: Uuid) {
        let Some(game) = &self.game else { return };
        let event = build_game_update(game, None);
        self.send_to(player_id, event);
    }

    fn handle_action(&mut self, player_id: Uuid, event: ClientEvent) {
        let Some(game) = &mut self.game else { return };
        match engine::apply(game, player_id, event) {
            Ok(broadcasts) => {
                for item in broadcasts {
                    match item {
                        engine::Broadcast::Room(ev) => self.broadcast(ev),
                        engine::Broadcast::To(target, ev) => self.send_to(target, ev),
                    }
                }
                self.broadcast_game_update();
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(room = %self.room_code, error = %err, "fatal engine invariant violated, terminating room");
                self.broadcast(ServerEvent::Log { message: "the room encountered a fatal error and is closing".into() });
                self.game = None;
            }
            Err(err) => {
                tracing::debug!(room = %self.room_code, %player_id, error = %err, "dropped invalid action");
            }
        }
    }

    fn broadcast_game_update(&mut self) {
        let Some(game) = &self.game else { return };
        let event = build_game_update(game, self.last_snapshot.as_ref());
        self.last_snapshot = Some(serde_json::to_value(game).expect("GameState always serializes"));
        self.broadcast(event);
    }

    fn broadcast_roster(&self) {
        self.broadcast(ServerEvent::RosterUpdate { players: self.roster.clone() });
    }

    fn broadcast(&self, event: ServerEvent) {
        for tx in self.connections.values() {
            let _ = tx.send(event.clone());
        }
    }

    fn send_to(&self, player_id: Uuid, event: ServerEvent) {
        if let Some(tx) = self.connections.get(&player_id) {
            let _ = tx.send(event);
        }
    }
}
