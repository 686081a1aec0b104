//! End-to-end engine scenarios (§8 of the design doc): each test drives
//! `engine::apply` the way the room actor does, with the deck and hands
//! pre-arranged so the outcome is deterministic.

use uuid::Uuid;

use dealhouse_backend::game::card::{ActionKind, Color, Deck, PropertyFace, RentFace};
use dealhouse_backend::game::{apply, Card, ClientEvent, GameState, Player, TurnPhase};

fn money(id: u32, value: u32) -> Card {
    Card::Money { id, value }
}

fn action(id: u32, name: ActionKind, value: u32) -> Card {
    Card::Action { id, name, value }
}

fn property(id: u32, colors: &[Color], value: u32) -> Card {
    Card::Property(PropertyFace {
        id,
        name: "Property".into(),
        legal_colors: colors.to_vec(),
        current_color: colors[0],
        value,
        is_wild: colors.len() > 1,
    })
}

fn rent(id: u32, colors: &[Color], value: u32) -> Card {
    Card::Rent(RentFace { id, colors: colors.to_vec(), value, is_wild: colors.len() > 2 })
}

/// Builds a two-player game with empty hands, deck seeded for determinism,
/// and the first player's turn already open (ACTIONS phase).
fn two_player_game() -> (GameState, Uuid, Uuid) {
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();
    let players = vec![Player::new(p1, "alice"), Player::new(p2, "bob")];
    let mut state = GameState::new("ABC123", players, Deck::new_seeded(99));
    state.start_turn();
    // Tests hand-arrange exact hands below; clear whatever the opening draw gave.
    state.get_player_mut(p1).unwrap().hand.clear();
    state.get_player_mut(p2).unwrap().hand.clear();
    (state, p1, p2)
}

#[test]
fn s1_basic_turn() {
    let (mut state, p1, p2) = two_player_game();
    let money_card = money(9001, 2);
    let pass_go = action(9002, ActionKind::PassGo, 1);
    state.get_player_mut(p1).unwrap().hand.push(money_card);
    state.get_player_mut(p1).unwrap().hand.push(pass_go);

    apply(&mut state, p1, ClientEvent::ToBank { card: 9001 }).unwrap();
    assert_eq!(state.get_player(p1).unwrap().bank.len(), 1);
    assert_eq!(state.get_player(p1).unwrap().bank[0].value(), 2);

    let hand_before = state.get_player(p1).unwrap().hand.len();
    apply(&mut state, p1, ClientEvent::PassGo { card: 9002 }).unwrap();
    assert_eq!(state.get_player(p1).unwrap().hand.len(), hand_before - 1 + 2);

    apply(&mut state, p1, ClientEvent::SkipTurn).unwrap();
    assert_eq!(state.turn_index, 1);
    assert_eq!(state.actions_remaining, 3);
    assert_eq!(state.current_player_id(), p2);
}

/// Sets up P1 with a complete red set (rent ladder [2,3,6], amount 6 at 3 cards)
/// and P2 holding Money(5) plus a Just Say No, as in S2/S3.
fn red_rent_setup() -> (GameState, Uuid, Uuid, u32 /* rent card id */, u32 /* p2 jsn id */) {
    let (mut state, p1, p2) = two_player_game();
    for id in [101u32, 102, 103] {
        state.get_player_mut(p1).unwrap().place_to_properties(property(id, &[Color::Red], 3), Color::Red);
    }
    assert_eq!(state.get_player(p1).unwrap().rent_amount_for_color(Color::Red), 6);

    let rent_card_id = 9010;
    state.get_player_mut(p1).unwrap().hand.push(rent(rent_card_id, &[Color::Red, Color::Yellow], 1));

    state.get_player_mut(p2).unwrap().hand.push(money(9011, 5));
    let p2_jsn = 9012;
    state.get_player_mut(p2).unwrap().hand.push(action(p2_jsn, ActionKind::JustSayNo, 4));

    (state, p1, p2, rent_card_id, p2_jsn)
}

#[test]
fn s2_rent_with_refusal_cancel() {
    let (mut state, p1, p2, rent_card_id, p2_jsn) = red_rent_setup();

    apply(&mut state, p1, ClientEvent::Rent { card: rent_card_id, color: Color::Red }).unwrap();
    assert_eq!(state.phase, TurnPhase::PendingRefusal);

    apply(&mut state, p2, ClientEvent::RefusalChoice { refuse: true, card: Some(p2_jsn) }).unwrap();
    // P1 holds no Just Say No of their own, so they decline to counter.
    apply(&mut state, p1, ClientEvent::RefusalChoice { refuse: false, card: None }).unwrap();

    assert!(state.pending_rent.is_none());
    assert_eq!(state.get_player(p2).unwrap().bank.len(), 1, "P2's money was never taken");
    assert_eq!(state.get_player(p1).unwrap().bank.len(), 0);
    assert_eq!(state.turn_index, 0, "still P1's turn, just one action slot spent");
    assert_eq!(state.actions_remaining, 2);
}

#[test]
fn s3_rent_with_double_counter() {
    let (mut state, p1, p2, rent_card_id, p2_jsn) = red_rent_setup();
    let p1_jsn = 9013;
    state.get_player_mut(p1).unwrap().hand.push(action(p1_jsn, ActionKind::JustSayNo, 4));

    apply(&mut state, p1, ClientEvent::Rent { card: rent_card_id, color: Color::Red }).unwrap();

    apply(&mut state, p2, ClientEvent::RefusalChoice { refuse: true, card: Some(p2_jsn) }).unwrap();
    apply(&mut state, p1, ClientEvent::RefusalChoice { refuse: true, card: Some(p1_jsn) }).unwrap();
    apply(&mut state, p2, ClientEvent::RefusalChoice { refuse: false, card: None }).unwrap();

    assert_eq!(state.phase, TurnPhase::PendingRent);
    apply(&mut state, p2, ClientEvent::RentPayment { selected_cards: vec![9011] }).unwrap();

    assert!(state.pending_rent.is_none());
    assert_eq!(state.get_player(p2).unwrap().bank.len(), 0);
    let p1_bank = &state.get_player(p1).unwrap().bank;
    assert_eq!(p1_bank.len(), 1);
    assert_eq!(p1_bank[0].value(), 5);
}

#[test]
fn s4_deal_breaker_with_extras() {
    let (mut state, p1, p2) = two_player_game();
    // P2: 3 standard reds + 1 multicolor wild assigned to red, plus a house.
    for id in [201u32, 202, 203] {
        state.get_player_mut(p2).unwrap().place_to_properties(property(id, &[Color::Red], 3), Color::Red);
    }
    state.get_player_mut(p2).unwrap().place_to_properties(property(204, &Color::ALL, 0), Color::Red);
    state.get_player_mut(p2).unwrap().place_to_properties(action(205, ActionKind::House, 3), Color::Red);
    assert_eq!(state.get_player(p2).unwrap().property_count(Color::Red), 4);

    let deal_breaker_id = 9020;
    state.get_player_mut(p1).unwrap().hand.push(action(deal_breaker_id, ActionKind::DealBreaker, 5));

    apply(
        &mut state,
        p1,
        ClientEvent::DealBreaker {
            card: deal_breaker_id,
            target_player: p2,
            target_color: Color::Red,
            selected_cards: Some(vec![201, 202, 203]),
        },
    )
    .unwrap();
    assert_eq!(state.phase, TurnPhase::PendingRefusal);
    apply(&mut state, p2, ClientEvent::RefusalChoice { refuse: false, card: None }).unwrap();

    let p1_red = state.get_player(p1).unwrap().properties.get(&Color::Red).unwrap();
    assert_eq!(p1_red.len(), 4, "3 red properties plus the house");
    assert!(p1_red.iter().any(|c| c.is_action(ActionKind::House)));

    let p2_red = state.get_player(p2).unwrap().properties.get(&Color::Red).unwrap();
    assert_eq!(p2_red.len(), 1);
    assert_eq!(p2_red[0].id(), 204);
}

#[test]
fn s5_forced_deal_breaks_completeness() {
    let (mut state, p1, p2) = two_player_game();
    state.get_player_mut(p1).unwrap().place_to_properties(property(301, &[Color::Blue], 4), Color::Blue);
    state.get_player_mut(p1).unwrap().place_to_properties(property(302, &[Color::Blue], 4), Color::Blue);
    state.get_player_mut(p1).unwrap().place_to_properties(action(303, ActionKind::House, 3), Color::Blue);
    assert!(state.get_player(p1).unwrap().has_house(Color::Blue));

    state.get_player_mut(p2).unwrap().place_to_properties(property(401, &[Color::Green], 4), Color::Green);

    let forced_deal_id = 9030;
    state.get_player_mut(p1).unwrap().hand.push(action(forced_deal_id, ActionKind::ForcedDeal, 3));

    apply(
        &mut state,
        p1,
        ClientEvent::ForcedDeal { card: forced_deal_id, target_property: 401, user_property: 301 },
    )
    .unwrap();
    apply(&mut state, p2, ClientEvent::RefusalChoice { refuse: false, card: None }).unwrap();

    let p1 = state.get_player(p1).unwrap();
    assert_eq!(p1.property_count(Color::Blue), 1);
    assert!(!p1.has_house(Color::Blue), "house migrates once the blue set breaks");
    assert!(p1.bank.iter().any(|c| c.is_action(ActionKind::House)));
    assert_eq!(p1.property_count(Color::Green), 1);
}

#[test]
fn s6_win_trigger_locks_the_game() {
    let (mut state, p1, _p2) = two_player_game();
    // Two complete sets already in hand, one card short of a third (mint).
    state.get_player_mut(p1).unwrap().place_to_properties(property(501, &[Color::Brown], 1), Color::Brown);
    state.get_player_mut(p1).unwrap().place_to_properties(property(502, &[Color::Brown], 1), Color::Brown);
    state.get_player_mut(p1).unwrap().place_to_properties(property(503, &[Color::Blue], 4), Color::Blue);
    state.get_player_mut(p1).unwrap().place_to_properties(property(504, &[Color::Blue], 4), Color::Blue);
    state.get_player_mut(p1).unwrap().place_to_properties(property(505, &[Color::Mint], 1), Color::Mint);
    assert!(!state.get_player(p1).unwrap().has_won());

    state.get_player_mut(p1).unwrap().hand.push(property(506, &[Color::Mint], 1));
    apply(&mut state, p1, ClientEvent::ToProperties { card: 506, current_color: Color::Mint }).unwrap();

    assert_eq!(state.winner, Some(p1));
    assert_eq!(state.phase, TurnPhase::Win);

    let err = apply(&mut state, p1, ClientEvent::SkipTurn).unwrap_err();
    assert!(matches!(err, dealhouse_backend::game::EngineError::GameOver));
}
