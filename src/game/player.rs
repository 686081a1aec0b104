//! Player state: hand, bank, and property sets keyed by color.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::{ActionKind, Card, CardId, Color};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub hand: Vec<Card>,
    pub bank: Vec<Card>,
    pub properties: HashMap<Color, Vec<Card>>,
}

impl Player {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hand: Vec::new(),
            bank: Vec::new(),
            properties: HashMap::new(),
        }
    }

    pub fn remove_from_hand(&mut self, card_id: CardId) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.id() == card_id)?;
        Some(self.hand.remove(idx))
    }

    pub fn place_to_bank(&mut self, card: Card) {
        self.bank.push(card);
    }

    /// Places a property card at `chosen_color`, reassigning a wild's current color
    /// if needed, then runs set-completeness upkeep on the destination color.
    pub fn place_to_properties(&mut self, mut card: Card, chosen_color: Color) {
        if let Some(face) = card.as_property_mut() {
            face.current_color = chosen_color;
        }
        self.properties.entry(chosen_color).or_default().push(card);
        self.upkeep_color(chosen_color);
    }

    /// Moves a wild property already in play to a new legal color.
    /// Returns false if the card is not a wild in this player's properties
    /// or `new_color` is not among its legal colors.
    pub fn reassign_wild(&mut self, card_id: CardId, new_color: Color) -> bool {
        let old_color = match self.find_property_color(card_id) {
            Some(c) => c,
            None => return false,
        };
        let cards = self.properties.get_mut(&old_color).unwrap();
        let idx = match cards.iter().position(|c| c.id() == card_id) {
            Some(i) => i,
            None => return false,
        };
        let legal = match cards[idx].as_property() {
            Some(face) if face.is_wild && face.legal_colors.contains(&new_color) => true,
            _ => false,
        };
        if !legal {
            return false;
        }
        let mut card = cards.remove(idx);
        if let Some(face) = card.as_property_mut() {
            face.current_color = new_color;
        }
        self.upkeep_color(old_color);
        self.properties.entry(new_color).or_default().push(card);
        self.upkeep_color(new_color);
        true
    }

    /// Removes a single property card (identified by id) from wherever it
    /// currently sits, running upkeep on the vacated color. Returns the card
    /// and the color it was removed from.
    pub fn take_property(&mut self, card_id: CardId) -> Option<(Card, Color)> {
        let color = self.find_property_color(card_id)?;
        let cards = self.properties.get_mut(&color)?;
        let idx = cards.iter().position(|c| c.id() == card_id)?;
        let card = cards.remove(idx);
        if cards.is_empty() {
            self.properties.remove(&color);
        }
        self.upkeep_color(color);
        Some((card, color))
    }

    /// Removes an entire color's property list (including House/Hotel), for
    /// Deal Breaker's whole-set transfer. Does not run upkeep on other colors.
    pub fn take_color_set(&mut self, color: Color) -> Vec<Card> {
        self.properties.remove(&color).unwrap_or_default()
    }

    fn find_property_color(&self, card_id: CardId) -> Option<Color> {
        self.properties
            .iter()
            .find(|(_, cards)| cards.iter().any(|c| c.id() == card_id))
            .map(|(color, _)| *color)
    }

    /// Number of raw property cards (excluding House/Hotel) currently at `color`.
    pub fn property_count(&self, color: Color) -> usize {
        self.properties
            .get(&color)
            .map(|cards| cards.iter().filter(|c| c.as_property().is_some()).count())
            .unwrap_or(0)
    }

    pub fn complete_set_count(&self, color: Color) -> usize {
        self.property_count(color) / color.full_set_size()
    }

    pub fn count_full_sets(&self) -> usize {
        Color::ALL.iter().map(|&c| self.complete_set_count(c)).sum()
    }

    /// True if `color` holds fewer cards than its full-set size — a color
    /// with no completed set yet. Sly Deal and Forced Deal may only take
    /// property cards from such a color; once a color reaches full-set size
    /// every card in it (including any surplus) is locked to Deal Breaker.
    pub fn is_color_steal_eligible(&self, color: Color) -> bool {
        let n = self.property_count(color);
        n > 0 && n < color.full_set_size()
    }

    /// True if `color` holds at least a full set's worth of cards — what
    /// Deal Breaker can take. A count beyond the full-set size (a wild
    /// stacked onto an already-complete set) is still one complete set with
    /// a surplus card; the handler picks which full-set-size cards transfer.
    pub fn is_color_complete(&self, color: Color) -> bool {
        self.property_count(color) >= color.full_set_size()
    }

    pub fn has_won(&self) -> bool {
        self.count_full_sets() >= 3
    }

    pub fn has_house(&self, color: Color) -> bool {
        self.properties
            .get(&color)
            .map(|cards| cards.iter().any(|c| c.is_action(ActionKind::House)))
            .unwrap_or(false)
    }

    pub fn has_hotel(&self, color: Color) -> bool {
        self.properties
            .get(&color)
            .map(|cards| cards.iter().any(|c| c.is_action(ActionKind::Hotel)))
            .unwrap_or(false)
    }

    /// Re-checks the complete-set count at `color` and migrates surplus House/Hotel
    /// cards to the bank if the set count dropped below what they require.
    pub fn upkeep_color(&mut self, color: Color) {
        let complete = self.complete_set_count(color);
        let Some(cards) = self.properties.get_mut(&color) else {
            return;
        };
        let house_count = cards.iter().filter(|c| c.is_action(ActionKind::House)).count();
        let hotel_count = cards.iter().filter(|c| c.is_action(ActionKind::Hotel)).count();

        let mut surplus_houses = house_count.saturating_sub(complete);
        let mut surplus_hotels = hotel_count.saturating_sub(complete);

        let mut migrated = Vec::new();
        cards.retain(|c| {
            if surplus_houses > 0 && c.is_action(ActionKind::House) {
                surplus_houses -= 1;
                migrated.push(c.clone());
                false
            } else if surplus_hotels > 0 && c.is_action(ActionKind::Hotel) {
                surplus_hotels -= 1;
                migrated.push(c.clone());
                false
            } else {
                true
            }
        });
        if cards.is_empty() {
            self.properties.remove(&color);
        }
        self.bank.extend(migrated);
    }

    /// Rent owed for a color this player holds: the ladder value for the
    /// current property count, plus house/hotel surcharges.
    pub fn rent_amount_for_color(&self, color: Color) -> u32 {
        let count = self.property_count(color);
        if count == 0 {
            return 0;
        }
        let ladder = color.rent_ladder();
        let idx = count.min(color.full_set_size()) - 1;
        let mut amount = ladder.get(idx).copied().unwrap_or(0);
        if self.has_house(color) {
            amount += 3;
        }
        if self.has_hotel(color) {
            amount += 4;
        }
        amount
    }

    /// Total liquid value the player could offer toward a debt (bank + properties).
    pub fn total_assets_value(&self) -> u32 {
        let bank_total: u32 = self.bank.iter().map(Card::value).sum();
        let prop_total: u32 = self.properties.values().flatten().map(Card::value).sum();
        bank_total + prop_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::PropertyFace;

    fn wild(id: CardId, colors: &[Color]) -> Card {
        Card::Property(PropertyFace {
            id,
            name: "Wild".into(),
            legal_colors: colors.to_vec(),
            current_color: colors[0],
            value: 4,
            is_wild: colors.len() > 1,
        })
    }

    fn house(id: CardId) -> Card {
        Card::Action {
            id,
            name: ActionKind::House,
            value: 3,
        }
    }

    #[test]
    fn upkeep_migrates_surplus_house_when_set_breaks() {
        let mut p = Player::new(Uuid::nil(), "p1");
        p.place_to_properties(wild(1, &[Color::Blue]), Color::Blue);
        p.place_to_properties(wild(2, &[Color::Blue]), Color::Blue);
        p.place_to_properties(house(3), Color::Blue);
        assert!(p.has_house(Color::Blue));
        assert_eq!(p.complete_set_count(Color::Blue), 1);

        // remove one blue card manually to simulate a steal
        let cards = p.properties.get_mut(&Color::Blue).unwrap();
        let idx = cards.iter().position(|c| c.id() == 1).unwrap();
        cards.remove(idx);
        p.upkeep_color(Color::Blue);

        assert!(!p.has_house(Color::Blue));
        assert!(p.bank.iter().any(|c| c.is_action(ActionKind::House)));
    }

    #[test]
    fn reassign_wild_moves_card_and_runs_upkeep() {
        let mut p = Player::new(Uuid::nil(), "p1");
        p.place_to_properties(wild(1, &[Color::Blue, Color::Green]), Color::Blue);
        p.place_to_properties(wild(2, &[Color::Blue]), Color::Blue);
        assert_eq!(p.complete_set_count(Color::Blue), 1);

        assert!(p.reassign_wild(1, Color::Green));
        assert_eq!(p.complete_set_count(Color::Blue), 0);
        assert_eq!(p.property_count(Color::Green), 1);
    }

    #[test]
    fn has_won_requires_three_full_sets() {
        let mut p = Player::new(Uuid::nil(), "p1");
        assert!(!p.has_won());
        p.place_to_properties(wild(1, &[Color::Brown]), Color::Brown);
        p.place_to_properties(wild(2, &[Color::Brown]), Color::Brown);
        p.place_to_properties(wild(3, &[Color::Mint]), Color::Mint);
        p.place_to_properties(wild(4, &[Color::Mint]), Color::Mint);
        p.place_to_properties(wild(5, &[Color::Blue]), Color::Blue);
        p.place_to_properties(wild(6, &[Color::Blue]), Color::Blue);
        assert!(p.has_won());
    }
}
