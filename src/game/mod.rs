//! Game module - card catalog, player/turn state, and the card-effect engine.

pub mod card;
pub mod engine;
pub mod events;
pub mod player;
pub mod state;

pub use card::{Card, CardId, Color, Deck, CANONICAL_DECK};
pub use engine::{apply, new_game, Broadcast, EngineError};
pub use events::{ClientEvent, ServerEvent};
pub use player::Player;
pub use state::{GameState, TurnPhase};
