//! Wire protocol: inbound actions from clients, outbound events broadcast by the hub.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::{CardId, Color};
use super::state::GameState;

/// Messages a client may send, dispatched on the `action` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientEvent {
    EstablishConnection { player_id: Uuid },
    PlayerReady { is_ready: bool },
    StartGame,
    InitialGameState,
    SkipTurn,

    ToBank { card: CardId },
    ToProperties { card: CardId, current_color: Color },
    ReassignWild { card: CardId, new_color: Color },

    PassGo { card: CardId },
    ItsYourBirthday { card: CardId },
    DebtCollector { card: CardId, target_player: Uuid },
    Rent { card: CardId, color: Color },
    MulticolorRent { card: CardId, color: Color, target_player: Uuid },
    DoubleTheRent { card: CardId, double_the_rent_card: CardId },
    SlyDeal { card: CardId, target_property: CardId },
    ForcedDeal { card: CardId, target_property: CardId, user_property: CardId },
    DealBreaker { card: CardId, target_player: Uuid, target_color: Color, selected_cards: Option<Vec<CardId>> },
    House { card: CardId, target_color: Color },
    Hotel { card: CardId, target_color: Color },

    RentPayment { selected_cards: Vec<CardId> },

    RefusalChoice { refuse: bool, card: Option<CardId> },
}

/// Messages the server broadcasts, tagged by the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Rejection {
        #[serde(rename = "data")]
        reason: String,
    },

    RosterUpdate { players: Vec<RosterEntry> },
    GameStarted,
    GameUpdate { is_full_state: bool, state: serde_json::Value },

    CardPlayed { player: Uuid, card: CardId },
    RentPreRequest { recipient: Uuid, payer: Uuid, amount: u32 },
    RentRequest { recipient: Uuid, payer: Uuid, amount: u32 },
    RentPaid { recipient: Uuid, payer: Uuid, amount: u32 },

    PropertyStolen { thief: Uuid, victim: Uuid, card: CardId },
    PropertySwap { a_player: Uuid, a_card: CardId, b_player: Uuid, b_card: CardId },
    DealBreakerOverlay { thief: Uuid, victim: Uuid, color: Color },

    RefusalRequest { holder: Uuid, trigger_summary: String },
    RefusalResponse { holder: Uuid, refused: bool },

    PlayerDisconnected { player: Uuid },
    GameOver { winner: Uuid },
    Log { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    pub is_ready: bool,
}

/// Builds the outbound `game_update` payload, full or diffed against a prior snapshot.
/// A `None` previous snapshot always yields a full-state update.
pub fn build_game_update(state: &GameState, previous: Option<&serde_json::Value>) -> ServerEvent {
    let full = serde_json::to_value(state).expect("GameState always serializes");
    match previous {
        None => ServerEvent::GameUpdate { is_full_state: true, state: full },
        Some(prev) => {
            let diff = diff_top_level(prev, &full);
            ServerEvent::GameUpdate { is_full_state: false, state: diff }
        }
    }
}

/// Shallow diff of top-level object fields; used so repeat broadcasts only carry
/// what actually changed since the last snapshot sent to this room.
fn diff_top_level(prev: &serde_json::Value, next: &serde_json::Value) -> serde_json::Value {
    let (Some(prev_obj), Some(next_obj)) = (prev.as_object(), next.as_object()) else {
        return next.clone();
    };
    let mut out = serde_json::Map::new();
    for (key, value) in next_obj {
        if prev_obj.get(key) != Some(value) {
            out.insert(key.clone(), value.clone());
        }
    }
    serde_json::Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_deserializes_by_action_tag() {
        let json = r#"{"action":"to_bank","card":7}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(ev, ClientEvent::ToBank { card: 7 }));
    }

    #[test]
    fn diff_only_contains_changed_fields() {
        let prev = serde_json::json!({"a": 1, "b": 2});
        let next = serde_json::json!({"a": 1, "b": 3});
        let diff = diff_top_level(&prev, &next);
        assert_eq!(diff, serde_json::json!({"b": 3}));
    }
}
