//! API module - HTTP handlers and routes

mod handlers;
mod routes;

use crate::config::Config;
use crate::db::RoomDirectory;
use crate::ws::RoomRegistry;

pub use routes::routes;

/// Shared application state: the room directory (C7), the registry of live
/// room actors (C6), and the environment-derived config.
#[derive(Clone)]
pub struct AppState {
    pub directory: RoomDirectory,
    pub registry: RoomRegistry,
    pub config: Config,
}
