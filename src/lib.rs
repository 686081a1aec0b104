//! dealhouse_backend - Monopoly Deal game server
//!
//! A real-time multiplayer card game server built with:
//! - Axum for HTTP/WebSocket
//! - SQLx for PostgreSQL persistence (room directory)
//! - An in-process room actor per active game
//!
//! Architecture:
//! - `api/` - HTTP handlers for room lifecycle
//! - `game/` - card catalog, player/turn state, and the card-effect engine
//! - `db/` - room directory backing store
//! - `ws/` - WebSocket hub and per-room actor loop

pub mod api;
pub mod db;
pub mod game;
pub mod ws;

pub mod config;
pub mod error;
