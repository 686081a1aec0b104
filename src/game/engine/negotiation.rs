//! Just Say No refusal chains, multi-payer queues, and payment settlement (C5).

use uuid::Uuid;

use super::{check_win, Broadcast, EngineError};
use crate::game::card::{ActionKind, Card, CardId};
use crate::game::events::ServerEvent;
use crate::game::state::{
    GameState, PayerQueue, PendingRefusal, PendingRent, PendingTrigger, RentSource, TurnPhase,
};

/// Starts (or continues) a money-collection trigger against a queue of payers.
/// Called once per action (Rent, multicolor Rent, Debt Collector, It's Your
/// Birthday) with the full list of opponents who owe `amount`.
pub fn begin_money_trigger(
    state: &mut GameState,
    actor: Uuid,
    targets: Vec<Uuid>,
    amount: u32,
    source: RentSource,
) -> Vec<Broadcast> {
    let mut queue = PayerQueue {
        recipient: actor,
        amount,
        remaining: targets,
        source,
        doubled: false,
    };
    match pop_next_payer(&mut queue) {
        Some(first) => {
            // Announce the whole pending collection to the room before the
            // first payer's refusal chain opens; `rent_request` below fires
            // per payer once each sub-chain actually resolves.
            let mut out = vec![Broadcast::room(ServerEvent::RentPreRequest { recipient: actor, payer: first, amount })];
            state.payer_queue = Some(queue);
            out.extend(start_refusal_chain(
                state,
                actor,
                first,
                PendingTrigger::Rent { recipient: actor, payer: first, amount },
            ));
            out
        }
        None => Vec::new(),
    }
}

/// Starts a refusal chain gating a direct steal/swap effect (no payer queue).
pub fn begin_steal_trigger(
    state: &mut GameState,
    actor: Uuid,
    holder: Uuid,
    trigger: PendingTrigger,
) -> Vec<Broadcast> {
    start_refusal_chain(state, actor, holder, trigger)
}

fn pop_next_payer(queue: &mut PayerQueue) -> Option<Uuid> {
    if queue.remaining.is_empty() {
        None
    } else {
        Some(queue.remaining.remove(0))
    }
}

fn start_refusal_chain(state: &mut GameState, initiator: Uuid, target: Uuid, trigger: PendingTrigger) -> Vec<Broadcast> {
    state.pending_refusal = Some(PendingRefusal {
        initiator,
        target,
        holder: target,
        count: 0,
        trigger,
    });
    state.phase = TurnPhase::PendingRefusal;
    vec![Broadcast::room(ServerEvent::RefusalRequest {
        holder: target,
        trigger_summary: trigger_summary(&state.pending_refusal.as_ref().unwrap().trigger),
    })]
}

fn trigger_summary(trigger: &PendingTrigger) -> String {
    match trigger {
        PendingTrigger::Rent { amount, .. } => format!("rent:{amount}"),
        PendingTrigger::SlyDeal { card_id, .. } => format!("sly_deal:{card_id}"),
        PendingTrigger::ForcedDeal { .. } => "forced_deal".to_string(),
        PendingTrigger::DealBreaker { color, .. } => format!("deal_breaker:{color:?}"),
    }
}

/// Handles an incoming `refusal_choice` from whoever currently holds the
/// decision. Only the current holder's response is accepted (§4.5).
pub fn refusal_choice(
    state: &mut GameState,
    actor: Uuid,
    refuse: bool,
    card: Option<CardId>,
) -> Result<Vec<Broadcast>, EngineError> {
    let pending = state.pending_refusal.clone().ok_or(EngineError::WrongPhase)?;
    if pending.holder != actor {
        return Err(EngineError::NotYourTurn);
    }

    let mut out = Vec::new();

    if refuse {
        let card_id = card.ok_or_else(|| EngineError::InvalidTarget("missing just_say_no card id".into()))?;
        let player = state.get_player_mut(actor).ok_or(EngineError::CardNotFound)?;
        let just_say_no = player
            .hand
            .iter()
            .find(|c| c.id() == card_id)
            .cloned()
            .ok_or(EngineError::CardNotFound)?;
        if !just_say_no.is_action(ActionKind::JustSayNo) {
            return Err(EngineError::InvalidTarget("card is not Just Say No".into()));
        }
        player.remove_from_hand(card_id);
        state.discard(just_say_no);

        let next_holder = if actor == pending.target { pending.initiator } else { pending.target };
        let refusal = state.pending_refusal.as_mut().unwrap();
        refusal.count += 1;
        refusal.holder = next_holder;

        out.push(Broadcast::room(ServerEvent::RefusalResponse { holder: actor, refused: true }));
        out.push(Broadcast::room(ServerEvent::RefusalRequest {
            holder: next_holder,
            trigger_summary: trigger_summary(&refusal.trigger),
        }));
        return Ok(out);
    }

    out.push(Broadcast::room(ServerEvent::RefusalResponse { holder: actor, refused: false }));
    let applies = pending.count % 2 == 0;
    let trigger = pending.trigger.clone();
    state.pending_refusal = None;

    if applies {
        out.extend(apply_trigger(state, trigger)?);
    } else {
        out.push(Broadcast::room(ServerEvent::Log {
            message: "action was cancelled by Just Say No".to_string(),
        }));
        advance_after_trigger(state, &mut out);
    }

    Ok(out)
}

/// Executes the effect a just-resolved refusal chain was gating.
fn apply_trigger(state: &mut GameState, trigger: PendingTrigger) -> Result<Vec<Broadcast>, EngineError> {
    let mut out = Vec::new();
    match trigger {
        PendingTrigger::Rent { recipient, payer, amount } => {
            state.pending_rent = Some(PendingRent { recipient, payer, amount });
            state.phase = TurnPhase::PendingRent;
            out.push(Broadcast::room(ServerEvent::RentRequest { recipient, payer, amount }));
        }
        PendingTrigger::SlyDeal { thief, victim, card_id } => {
            let victim_player = state.get_player_mut(victim).ok_or(EngineError::Invariant("missing victim".into()))?;
            let (card, color) = victim_player
                .take_property(card_id)
                .ok_or_else(|| EngineError::Invariant("sly deal target vanished".into()))?;
            let thief_player = state.get_player_mut(thief).ok_or(EngineError::Invariant("missing thief".into()))?;
            thief_player.place_to_properties(card, color);
            out.push(Broadcast::room(ServerEvent::PropertyStolen { thief, victim, card: card_id }));
            if let Some(b) = check_win(state, thief) {
                out.push(b);
            }
            advance_after_trigger(state, &mut out);
        }
        PendingTrigger::ForcedDeal { initiator, victim, offered_card, target_card } => {
            let victim_player = state.get_player_mut(victim).ok_or(EngineError::Invariant("missing victim".into()))?;
            let (taken_card, taken_color) = victim_player
                .take_property(target_card)
                .ok_or_else(|| EngineError::Invariant("forced deal target vanished".into()))?;
            let initiator_player = state.get_player_mut(initiator).ok_or(EngineError::Invariant("missing initiator".into()))?;
            let (offered, offered_color) = initiator_player
                .take_property(offered_card)
                .ok_or_else(|| EngineError::Invariant("forced deal offer vanished".into()))?;
            initiator_player.place_to_properties(taken_card, taken_color);
            let victim_player = state.get_player_mut(victim).unwrap();
            victim_player.place_to_properties(offered, offered_color);

            out.push(Broadcast::room(ServerEvent::PropertySwap {
                a_player: initiator,
                a_card: offered_card,
                b_player: victim,
                b_card: target_card,
            }));
            if let Some(b) = check_win(state, initiator) {
                out.push(b);
            }
            advance_after_trigger(state, &mut out);
        }
        PendingTrigger::DealBreaker { thief, victim, color, selected_cards } => {
            let full_set_size = color.full_set_size();
            let victim_ref = state.get_player(victim).ok_or(EngineError::Invariant("missing victim".into()))?;
            let raw_count = victim_ref.property_count(color);

            // Validate the selection against the victim's set *before*
            // detaching anything, so a malformed selected_cards payload
            // rejects cleanly instead of stranding already-removed cards.
            let keep_ids = if raw_count > full_set_size {
                let keep_ids = selected_cards
                    .ok_or_else(|| EngineError::InvalidTarget("deal breaker needs selected_cards".into()))?;
                if keep_ids.len() != full_set_size {
                    return Err(EngineError::InvalidTarget("must select exactly a full set".into()));
                }
                let matched = victim_ref
                    .properties
                    .get(&color)
                    .map(|cards| {
                        cards
                            .iter()
                            .filter(|c| c.as_property().is_some() && keep_ids.contains(&c.id()))
                            .count()
                    })
                    .unwrap_or(0);
                if matched != full_set_size {
                    return Err(EngineError::InvalidTarget("selected_cards did not match the set".into()));
                }
                Some(keep_ids)
            } else {
                None
            };

            let victim_player = state.get_player_mut(victim).unwrap();
            let set = victim_player.take_color_set(color);

            // House/Hotel always ride along with the set; only the raw
            // property cards are subject to the full-set-size selection.
            let (mut properties, extras): (Vec<Card>, Vec<Card>) =
                set.into_iter().partition(|c| c.as_property().is_some());

            let taken = if let Some(keep_ids) = keep_ids {
                let mut taken = Vec::with_capacity(full_set_size);
                let mut leftover = Vec::new();
                for card in properties.drain(..) {
                    if keep_ids.contains(&card.id()) {
                        taken.push(card);
                    } else {
                        leftover.push(card);
                    }
                }
                for card in leftover {
                    let victim_player = state.get_player_mut(victim).unwrap();
                    let dest_color = card.as_property().map(|p| p.current_color).unwrap_or(color);
                    victim_player.place_to_properties(card, dest_color);
                }
                taken
            } else {
                properties
            };

            let thief_player = state.get_player_mut(thief).ok_or(EngineError::Invariant("missing thief".into()))?;
            for card in taken.into_iter().chain(extras) {
                thief_player.properties.entry(color).or_default().push(card);
            }
            thief_player.upkeep_color(color);

            out.push(Broadcast::room(ServerEvent::DealBreakerOverlay { thief, victim, color }));
            if let Some(b) = check_win(state, thief) {
                out.push(b);
            }
            advance_after_trigger(state, &mut out);
        }
    }
    Ok(out)
}

/// After a steal-style trigger resolves (applied or cancelled), either move
/// to the next payer in an open queue or consume the acting action slot.
fn advance_after_trigger(state: &mut GameState, out: &mut Vec<Broadcast>) {
    if state.winner.is_some() {
        return;
    }
    if advance_payer_queue(state, out) {
        return;
    }
    if state.phase != TurnPhase::Win {
        state.phase = TurnPhase::Actions;
        state.consume_action();
    }
}

/// Pops the next payer off an open queue and starts their refusal sub-chain.
/// Returns true if a queue was open (whether or not it had a next payer).
fn advance_payer_queue(state: &mut GameState, out: &mut Vec<Broadcast>) -> bool {
    let Some(mut queue) = state.payer_queue.take() else {
        return false;
    };
    match pop_next_payer(&mut queue) {
        Some(next) => {
            let recipient = queue.recipient;
            let amount = queue.amount;
            state.payer_queue = Some(queue);
            out.push(Broadcast::room(ServerEvent::RentPreRequest { recipient, payer: next, amount }));
            out.extend(start_refusal_chain(
                state,
                recipient,
                next,
                PendingTrigger::Rent { recipient, payer: next, amount },
            ));
        }
        None => {
            state.phase = TurnPhase::Actions;
            state.consume_action();
        }
    }
    true
}

/// Settles an open rent/debt request: the payer nominates cards from bank and
/// properties summing to at least the amount owed (no change given back). A
/// payer whose total assets fall short of the amount must offer everything
/// they have rather than partially paying.
pub fn settle_payment(state: &mut GameState, actor: Uuid, selected_cards: Vec<CardId>) -> Result<Vec<Broadcast>, EngineError> {
    let pending = state.pending_rent.clone().ok_or(EngineError::WrongPhase)?;
    if pending.payer != actor {
        return Err(EngineError::NotYourTurn);
    }

    let payer = state.get_player_mut(actor).ok_or(EngineError::CardNotFound)?;
    let all_card_ids: std::collections::HashSet<CardId> = payer
        .bank
        .iter()
        .chain(payer.properties.values().flatten())
        .map(Card::id)
        .collect();
    if !selected_cards.iter().all(|id| all_card_ids.contains(id)) {
        return Err(EngineError::CardNotFound);
    }
    let selected_set: std::collections::HashSet<CardId> = selected_cards.iter().copied().collect();
    let selected_total: u32 = payer
        .bank
        .iter()
        .chain(payer.properties.values().flatten())
        .filter(|c| selected_set.contains(&c.id()))
        .map(Card::value)
        .sum();
    let total_assets = payer.total_assets_value();

    let covers_debt = selected_total >= pending.amount;
    let offers_everything = selected_set.len() == all_card_ids.len();
    if !covers_debt && !offers_everything {
        return Err(EngineError::InvalidTarget(
            "must offer all assets when the selection falls short of the amount owed".into(),
        ));
    }
    if total_assets >= pending.amount && !covers_debt {
        return Err(EngineError::InvalidTarget("selected cards do not cover the amount owed".into()));
    }

    let mut offered: Vec<Card> = Vec::with_capacity(selected_cards.len());
    for card_id in &selected_cards {
        if let Some(pos) = payer.bank.iter().position(|c| c.id() == *card_id) {
            offered.push(payer.bank.remove(pos));
            continue;
        }
        if let Some((card, _)) = payer.take_property(*card_id) {
            offered.push(card);
        }
    }

    let recipient = state.get_player_mut(pending.recipient).ok_or(EngineError::Invariant("missing recipient".into()))?;
    for card in offered {
        match card {
            Card::Money { .. } => recipient.place_to_bank(card),
            Card::Action { name: ActionKind::House, .. } | Card::Action { name: ActionKind::Hotel, .. } => {
                recipient.place_to_bank(card)
            }
            Card::Property(ref face) => {
                let color = face.current_color;
                recipient.place_to_properties(card, color);
            }
            other => recipient.place_to_bank(other),
        }
    }

    state.pending_rent = None;
    let mut out = vec![Broadcast::room(ServerEvent::RentPaid {
        recipient: pending.recipient,
        payer: actor,
        amount: pending.amount,
    })];
    if let Some(b) = check_win(state, pending.recipient) {
        out.push(b);
    }
    advance_after_trigger(state, &mut out);
    Ok(out)
}
