//! Property-stealing actions (C4): Sly Deal, Forced Deal, Deal Breaker. Each
//! enters a refusal chain (C5) before the actual transfer is carried out.

use uuid::Uuid;

use super::negotiation::begin_steal_trigger;
use super::{is_action_card, require_actions_phase, take_from_hand, Broadcast, EngineError};
use crate::game::card::{ActionKind, CardId, Color};
use crate::game::events::ServerEvent;
use crate::game::state::{GameState, PendingTrigger};

pub fn sly_deal(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    target_property: CardId,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let (victim, color) = find_property_owner(state, actor, target_property)?;
    if !state.get_player(victim).unwrap().is_color_steal_eligible(color) {
        return Err(EngineError::InvalidTarget("property belongs to a complete set".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::SlyDeal) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Sly Deal".into()));
    }
    state.discard(card);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_steal_trigger(
        state,
        actor,
        victim,
        PendingTrigger::SlyDeal { thief: actor, victim, card_id: target_property },
    ));
    Ok(out)
}

pub fn forced_deal(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    target_property: CardId,
    user_property: CardId,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let (victim, target_color) = find_property_owner(state, actor, target_property)?;
    if victim == actor {
        return Err(EngineError::InvalidTarget("cannot forced-deal your own property".into()));
    }
    if !state.get_player(victim).unwrap().is_color_steal_eligible(target_color) {
        return Err(EngineError::InvalidTarget("target property belongs to a complete set".into()));
    }
    let actor_player = state.get_player(actor).ok_or(EngineError::NotYourTurn)?;
    let offered_color = actor_player
        .properties
        .iter()
        .find(|(_, cards)| cards.iter().any(|c| c.id() == user_property && c.as_property().is_some()))
        .map(|(c, _)| *c)
        .ok_or_else(|| EngineError::InvalidTarget("you do not own that property".into()))?;

    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::ForcedDeal) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Forced Deal".into()));
    }
    state.discard(card);
    let _ = offered_color;
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_steal_trigger(
        state,
        actor,
        victim,
        PendingTrigger::ForcedDeal {
            initiator: actor,
            victim,
            offered_card: user_property,
            target_card: target_property,
        },
    ));
    Ok(out)
}

pub fn deal_breaker(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    target_player: Uuid,
    target_color: Color,
    selected_cards: Option<Vec<CardId>>,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    if target_player == actor {
        return Err(EngineError::InvalidTarget("cannot deal-break your own set".into()));
    }
    let victim = state.get_player(target_player).ok_or(EngineError::InvalidTarget("unknown target player".into()))?;
    if !victim.is_color_complete(target_color) {
        return Err(EngineError::InvalidTarget("target color is not a complete set".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::DealBreaker) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Deal Breaker".into()));
    }
    state.discard(card);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_steal_trigger(
        state,
        actor,
        target_player,
        PendingTrigger::DealBreaker { thief: actor, victim: target_player, color: target_color, selected_cards },
    ));
    Ok(out)
}

/// Finds which player currently owns `card_id` as a property and its color.
fn find_property_owner(state: &GameState, actor: Uuid, card_id: CardId) -> Result<(Uuid, Color), EngineError> {
    for player in &state.players {
        if player.id == actor {
            continue;
        }
        for (color, cards) in &player.properties {
            if cards.iter().any(|c| c.id() == card_id && c.as_property().is_some()) {
                return Ok((player.id, *color));
            }
        }
    }
    Err(EngineError::InvalidTarget("property not found among opponents".into()))
}
