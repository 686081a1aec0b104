//! Direct card actions (C4): bank/property placement, Pass Go, the four
//! money-collection cards, and House/Hotel building.

use uuid::Uuid;

use super::negotiation::begin_money_trigger;
use super::{check_win, is_action_card, require_actions_phase, take_from_hand, Broadcast, EngineError};
use crate::game::card::{ActionKind, CardId, Color};
use crate::game::events::ServerEvent;
use crate::game::state::{GameState, PendingTrigger, RentSource};

/// Commits a played action card's slot, advancing the turn if it was the last.
fn commit(state: &mut GameState) {
    state.consume_action();
}

pub fn skip_turn(state: &mut GameState, actor: Uuid) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    state.actions_remaining = 0;
    state.advance_turn();
    Ok(vec![Broadcast::room(ServerEvent::Log { message: format!("{actor} skipped their turn") })])
}

pub fn to_bank(state: &mut GameState, actor: Uuid, card_id: CardId) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let card = take_from_hand(state, actor, card_id)?;
    if card.as_property().is_some() {
        // put it back — property cards cannot be banked
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("property cards cannot be banked".into()));
    }
    state.get_player_mut(actor).unwrap().place_to_bank(card);
    commit(state);
    Ok(vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })])
}

pub fn to_properties(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    current_color: Color,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let card = take_from_hand(state, actor, card_id)?;
    let face = match card.as_property() {
        Some(f) => f,
        None => {
            state.get_player_mut(actor).unwrap().hand.push(card);
            return Err(EngineError::InvalidTarget("card is not a property".into()));
        }
    };
    if !face.legal_colors.contains(&current_color) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("color is not legal for this property".into()));
    }
    state.get_player_mut(actor).unwrap().place_to_properties(card, current_color);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    if let Some(b) = check_win(state, actor) {
        out.push(b);
    }
    if state.winner.is_none() {
        commit(state);
    }
    Ok(out)
}

pub fn reassign_wild(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    new_color: Color,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let player = state.get_player_mut(actor).ok_or(EngineError::NotYourTurn)?;
    if !player.reassign_wild(card_id, new_color) {
        return Err(EngineError::InvalidTarget("card is not a reassignable wild you own".into()));
    }
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    if let Some(b) = check_win(state, actor) {
        out.push(b);
    }
    if state.winner.is_none() {
        commit(state);
    }
    Ok(out)
}

pub fn pass_go(state: &mut GameState, actor: Uuid, card_id: CardId) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::PassGo) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Pass Go".into()));
    }
    state.discard(card);
    let drawn = state.deck.draw(2);
    state.get_player_mut(actor).unwrap().hand.extend(drawn);
    commit(state);
    Ok(vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })])
}

pub fn its_your_birthday(state: &mut GameState, actor: Uuid, card_id: CardId) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::ItsYourBirthday) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not It's Your Birthday".into()));
    }
    state.discard(card);
    let targets = state.turn_order_from_left_of(actor);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_money_trigger(state, actor, targets, 2, RentSource::Birthday));
    Ok(out)
}

pub fn debt_collector(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    target_player: Uuid,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    if target_player == actor || state.get_player(target_player).is_none() {
        return Err(EngineError::InvalidTarget("invalid debt collector target".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::DebtCollector) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Debt Collector".into()));
    }
    state.discard(card);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_money_trigger(state, actor, vec![target_player], 5, RentSource::DebtCollector));
    Ok(out)
}

pub fn rent(state: &mut GameState, actor: Uuid, card_id: CardId, color: Color) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let card = take_from_hand(state, actor, card_id)?;
    let rent_face = match card.as_rent_colors() {
        Some(colors) if colors.len() == 2 && colors.contains(&color) => colors,
        _ => {
            state.get_player_mut(actor).unwrap().hand.push(card);
            return Err(EngineError::InvalidTarget("card cannot charge rent for that color".into()));
        }
    };
    let _ = rent_face;
    let amount = state.get_player(actor).unwrap().rent_amount_for_color(color);
    state.discard(card);
    let targets = state.turn_order_from_left_of(actor);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_money_trigger(state, actor, targets, amount, RentSource::Rent));
    Ok(out)
}

pub fn multicolor_rent(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    color: Color,
    target_player: Uuid,
) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    if target_player == actor || state.get_player(target_player).is_none() {
        return Err(EngineError::InvalidTarget("invalid rent target".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    let is_wild_rent = card.as_rent_colors().map(|c| c.len() > 2).unwrap_or(false);
    if !is_wild_rent {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not a multicolor rent".into()));
    }
    let amount = state.get_player(actor).unwrap().rent_amount_for_color(color);
    state.discard(card);
    let mut out = vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })];
    out.extend(begin_money_trigger(state, actor, vec![target_player], amount, RentSource::Rent));
    Ok(out)
}

/// Doubles the amount of the rent currently being collected. Must be played
/// while that rent's queue/refusal/payment is still open this same turn, and
/// costs a second action slot — rejected if fewer than two remain (§4.3).
pub fn double_the_rent(
    state: &mut GameState,
    actor: Uuid,
    card_id: CardId,
    double_the_rent_card: CardId,
) -> Result<Vec<Broadcast>, EngineError> {
    if state.current_player_id() != actor {
        return Err(EngineError::NotYourTurn);
    }
    if state.actions_remaining < 2 {
        return Err(EngineError::InvalidTarget("not enough actions remaining to double the rent".into()));
    }
    let rent_is_live = match &state.payer_queue {
        Some(q) => q.recipient == actor && q.source == RentSource::Rent && !q.doubled,
        None => false,
    };
    if !rent_is_live {
        return Err(EngineError::WrongPhase);
    }

    let player = state.get_player_mut(actor).ok_or(EngineError::NotYourTurn)?;
    let card = player.remove_from_hand(double_the_rent_card).ok_or(EngineError::CardNotFound)?;
    if !is_action_card(&card, ActionKind::DoubleTheRent) {
        player.hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Double The Rent".into()));
    }
    state.discard(card);

    let queue = state.payer_queue.as_mut().unwrap();
    queue.amount *= 2;
    queue.doubled = true;
    if let Some(refusal) = state.pending_refusal.as_mut() {
        if let PendingTrigger::Rent { amount, .. } = &mut refusal.trigger {
            *amount *= 2;
        }
    }
    if let Some(pending_rent) = state.pending_rent.as_mut() {
        pending_rent.amount *= 2;
    }

    state.actions_remaining -= 1;
    Ok(vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: double_the_rent_card })])
}

pub fn house(state: &mut GameState, actor: Uuid, card_id: CardId, target_color: Color) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let player = state.get_player(actor).ok_or(EngineError::NotYourTurn)?;
    if player.complete_set_count(target_color) == 0 || player.has_house(target_color) {
        return Err(EngineError::InvalidTarget("color has no complete set available for a house".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::House) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not House".into()));
    }
    state.get_player_mut(actor).unwrap().place_to_properties(card, target_color);
    commit(state);
    Ok(vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })])
}

pub fn hotel(state: &mut GameState, actor: Uuid, card_id: CardId, target_color: Color) -> Result<Vec<Broadcast>, EngineError> {
    require_actions_phase(state, actor)?;
    let player = state.get_player(actor).ok_or(EngineError::NotYourTurn)?;
    if !target_color.hotel_eligible() {
        return Err(EngineError::InvalidTarget("this color cannot hold a hotel".into()));
    }
    if !player.has_house(target_color) || player.has_hotel(target_color) {
        return Err(EngineError::InvalidTarget("a hotel requires an existing house and no hotel yet".into()));
    }
    let card = take_from_hand(state, actor, card_id)?;
    if !is_action_card(&card, ActionKind::Hotel) {
        state.get_player_mut(actor).unwrap().hand.push(card);
        return Err(EngineError::InvalidTarget("card is not Hotel".into()));
    }
    state.get_player_mut(actor).unwrap().place_to_properties(card, target_color);
    commit(state);
    Ok(vec![Broadcast::room(ServerEvent::CardPlayed { player: actor, card: card_id })])
}
