//! Authoritative per-room game state: turn machine, pending rent/refusal
//! substates, and win detection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::{Card, CardId, Color, Deck};
use super::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    DrawPhase,
    Actions,
    PendingRent,
    PendingRefusal,
    Win,
}

/// One outstanding debt owed by `payer` to `recipient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRent {
    pub recipient: Uuid,
    pub payer: Uuid,
    pub amount: u32,
}

/// Whether a money-collection trigger was raised by a genuine Rent card, which
/// alone may be doubled by DoubleTheRent. Birthday and Debt Collector amounts
/// are fixed regardless of what double_the_rent the acting player holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentSource {
    Rent,
    Birthday,
    DebtCollector,
}

/// A refusal (Just Say No) chain in flight. `holder` is whoever must answer
/// next and alternates between `target` and `initiator` as Just Say No cards
/// are played; `count` is the number played so far in this chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRefusal {
    pub initiator: Uuid,
    pub target: Uuid,
    pub holder: Uuid,
    pub count: u32,
    pub trigger: PendingTrigger,
}

/// What effect is gated behind the refusal chain currently resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PendingTrigger {
    Rent { recipient: Uuid, payer: Uuid, amount: u32 },
    SlyDeal { thief: Uuid, victim: Uuid, card_id: CardId },
    ForcedDeal { initiator: Uuid, victim: Uuid, offered_card: CardId, target_card: CardId },
    DealBreaker {
        thief: Uuid,
        victim: Uuid,
        color: Color,
        selected_cards: Option<Vec<CardId>>,
    },
}

/// The queue of payers still owing a recipient for a group effect
/// (It's Your Birthday, multi-target Rent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerQueue {
    pub recipient: Uuid,
    pub amount: u32,
    pub remaining: Vec<Uuid>,
    pub source: RentSource,
    pub doubled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub room_code: String,
    pub deck: Deck,
    pub players: Vec<Player>,
    pub turn_index: usize,
    pub actions_remaining: u32,
    pub phase: TurnPhase,
    pub pending_rent: Option<PendingRent>,
    pub pending_refusal: Option<PendingRefusal>,
    pub payer_queue: Option<PayerQueue>,
    pub winner: Option<Uuid>,
}

impl GameState {
    pub fn new(room_code: impl Into<String>, players: Vec<Player>, deck: Deck) -> Self {
        Self {
            room_code: room_code.into(),
            deck,
            players,
            turn_index: 0,
            actions_remaining: 0,
            phase: TurnPhase::Idle,
            pending_rent: None,
            pending_refusal: None,
            payer_queue: None,
            winner: None,
        }
    }

    pub fn get_player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn current_player_id(&self) -> Uuid {
        self.players[self.turn_index].id
    }

    /// Turn order starting from the left of `from` (used for multi-payer queues).
    pub fn turn_order_from_left_of(&self, from: Uuid) -> Vec<Uuid> {
        let start = self.players.iter().position(|p| p.id == from).unwrap_or(0);
        let n = self.players.len();
        (1..n).map(|offset| self.players[(start + offset) % n].id).collect()
    }

    /// Begins a fresh turn for the current player: draw 5 if hand empty, else 2.
    pub fn start_turn(&mut self) {
        self.actions_remaining = 3;
        let idx = self.turn_index;
        let draw_n = if self.players[idx].hand.is_empty() { 5 } else { 2 };
        let cards = self.deck.draw(draw_n);
        self.players[idx].hand.extend(cards);
        self.phase = TurnPhase::Actions;
    }

    /// Advances to the next player and begins their turn.
    pub fn advance_turn(&mut self) {
        self.turn_index = (self.turn_index + 1) % self.players.len();
        self.start_turn();
    }

    /// Spends one action slot; if it was the last, switches to the next player.
    pub fn consume_action(&mut self) {
        if self.actions_remaining > 0 {
            self.actions_remaining -= 1;
        }
        if self.actions_remaining == 0 && self.phase == TurnPhase::Actions {
            self.advance_turn();
        }
    }

    /// Checks whether `player_id` just won and, if so, latches the winner.
    pub fn check_win(&mut self, player_id: Uuid) {
        if let Some(p) = self.get_player(player_id) {
            if p.has_won() {
                self.winner = Some(player_id);
                self.phase = TurnPhase::Win;
            }
        }
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn discard(&mut self, card: Card) {
        self.deck.discard(card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_state() -> GameState {
        let players = vec![
            Player::new(Uuid::new_v4(), "alice"),
            Player::new(Uuid::new_v4(), "bob"),
        ];
        GameState::new("ABC123", players, Deck::new_seeded(1))
    }

    #[test]
    fn start_turn_draws_five_on_empty_hand() {
        let mut state = two_player_state();
        state.start_turn();
        assert_eq!(state.players[0].hand.len(), 5);
        assert_eq!(state.actions_remaining, 3);
    }

    #[test]
    fn start_turn_draws_two_when_hand_nonempty() {
        let mut state = two_player_state();
        state.players[0].hand.push(Card::Money { id: 999, value: 1 });
        state.start_turn();
        assert_eq!(state.players[0].hand.len(), 3);
    }

    #[test]
    fn consume_action_advances_turn_at_zero() {
        let mut state = two_player_state();
        state.start_turn();
        state.actions_remaining = 1;
        state.consume_action();
        assert_eq!(state.turn_index, 1);
        assert_eq!(state.actions_remaining, 3);
    }

    #[test]
    fn turn_order_from_left_skips_self() {
        let mut state = two_player_state();
        let p3 = Player::new(Uuid::new_v4(), "carl");
        state.players.push(p3);
        let first = state.players[0].id;
        let order = state.turn_order_from_left_of(first);
        assert_eq!(order.len(), 2);
        assert!(!order.contains(&first));
    }
}
