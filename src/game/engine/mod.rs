//! Game engine: turn state machine (C3), card-effect dispatch (C4/C5).
//!
//! `apply` is the single entry point a room actor calls for every inbound
//! in-game message. It is a synchronous, pure function over `&mut GameState`
//! — no I/O, no await points — matching §5's requirement that a room's
//! state mutation never cross a suspension point.

mod actions;
mod negotiation;
mod trade;

use uuid::Uuid;

use super::card::{ActionKind, Card};
use super::events::{ClientEvent, ServerEvent};
use super::player::Player;
use super::state::{GameState, TurnPhase};
use crate::game::card::Deck;

/// An effect of a successfully applied message: either a room-wide broadcast
/// or a message addressed to a single connection.
#[derive(Debug, Clone)]
pub enum Broadcast {
    Room(ServerEvent),
    To(Uuid, ServerEvent),
}

impl Broadcast {
    pub fn room(event: ServerEvent) -> Self {
        Broadcast::Room(event)
    }
}

/// Rejections the engine can raise. Everything but `Invariant` is a §7 class-2
/// validation error: silently dropped by the caller, no state mutated, no
/// broadcast sent. `Invariant` is class 5 — the room aborts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("wrong phase for this action")]
    WrongPhase,
    #[error("card not found")]
    CardNotFound,
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("game already over")]
    GameOver,
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Invariant(_))
    }
}

type EngineResult = Result<Vec<Broadcast>, EngineError>;

/// Builds a fresh `GameState` for an admitted roster, deals every player
/// their opening 5-card hand, then starts the first player's turn. `players`
/// must already be in the randomized turn order the room decided at
/// `start_game` time; `seed` lets tests reproduce a draw. The opening deal
/// and the first turn's draw are two distinct events (§3 invariant 5):
/// dealing in `start_turn` alone would leave every player but the first with
/// an empty hand until their own first turn.
pub fn new_game(room_code: impl Into<String>, players: Vec<Player>, seed: Option<u64>) -> GameState {
    let deck = match seed {
        Some(s) => Deck::new_seeded(s),
        None => Deck::new_random(),
    };
    let mut state = GameState::new(room_code, players, deck);
    for idx in 0..state.players.len() {
        let cards = state.deck.draw(5);
        state.players[idx].hand.extend(cards);
    }
    state.start_turn();
    state
}

/// Dispatches one client message against the room's authoritative state.
pub fn apply(state: &mut GameState, actor: Uuid, event: ClientEvent) -> EngineResult {
    if state.is_over() {
        return Err(EngineError::GameOver);
    }

    match event {
        // Connection lifecycle / room admission messages are handled by the
        // hub before they ever reach the engine.
        ClientEvent::EstablishConnection { .. }
        | ClientEvent::PlayerReady { .. }
        | ClientEvent::StartGame
        | ClientEvent::InitialGameState => Err(EngineError::WrongPhase),

        ClientEvent::SkipTurn => actions::skip_turn(state, actor),

        ClientEvent::ToBank { card } => actions::to_bank(state, actor, card),
        ClientEvent::ToProperties { card, current_color } => {
            actions::to_properties(state, actor, card, current_color)
        }
        ClientEvent::ReassignWild { card, new_color } => {
            actions::reassign_wild(state, actor, card, new_color)
        }

        ClientEvent::PassGo { card } => actions::pass_go(state, actor, card),
        ClientEvent::ItsYourBirthday { card } => actions::its_your_birthday(state, actor, card),
        ClientEvent::DebtCollector { card, target_player } => {
            actions::debt_collector(state, actor, card, target_player)
        }
        ClientEvent::Rent { card, color } => actions::rent(state, actor, card, color),
        ClientEvent::MulticolorRent { card, color, target_player } => {
            actions::multicolor_rent(state, actor, card, color, target_player)
        }
        ClientEvent::DoubleTheRent { card, double_the_rent_card } => {
            actions::double_the_rent(state, actor, card, double_the_rent_card)
        }
        ClientEvent::House { card, target_color } => actions::house(state, actor, card, target_color),
        ClientEvent::Hotel { card, target_color } => actions::hotel(state, actor, card, target_color),

        ClientEvent::SlyDeal { card, target_property } => trade::sly_deal(state, actor, card, target_property),
        ClientEvent::ForcedDeal { card, target_property, user_property } => {
            trade::forced_deal(state, actor, card, target_property, user_property)
        }
        ClientEvent::DealBreaker { card, target_player, target_color, selected_cards } => {
            trade::deal_breaker(state, actor, card, target_player, target_color, selected_cards)
        }

        ClientEvent::RentPayment { selected_cards } => negotiation::settle_payment(state, actor, selected_cards),
        ClientEvent::RefusalChoice { refuse, card } => negotiation::refusal_choice(state, actor, refuse, card),
    }
}

/// Common guard for any action that spends a turn slot: must be the current
/// player's turn and the state must be in the open ACTIONS phase.
fn require_actions_phase(state: &GameState, actor: Uuid) -> Result<(), EngineError> {
    if state.current_player_id() != actor {
        return Err(EngineError::NotYourTurn);
    }
    if state.phase != TurnPhase::Actions {
        return Err(EngineError::WrongPhase);
    }
    Ok(())
}

/// Removes `card_id` from `actor`'s hand, validating it is actually there.
fn take_from_hand(state: &mut GameState, actor: Uuid, card_id: u32) -> Result<Card, EngineError> {
    let player = state.get_player_mut(actor).ok_or(EngineError::NotYourTurn)?;
    player.remove_from_hand(card_id).ok_or(EngineError::CardNotFound)
}

fn is_action_card(card: &Card, kind: ActionKind) -> bool {
    card.is_action(kind)
}

/// Runs win detection for `player_id` and, if they just won, latches WIN.
/// Returns the win broadcast, if any, to append to the caller's effect list.
fn check_win(state: &mut GameState, player_id: Uuid) -> Option<Broadcast> {
    state.check_win(player_id);
    if state.winner == Some(player_id) {
        Some(Broadcast::room(ServerEvent::GameOver { winner: player_id }))
    } else {
        None
    }
}
