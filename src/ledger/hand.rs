//! Remaining hands and dealer decks per seat.
//!
//! Each seat owns a hand (values it may still play as the active role) and
//! a deck (the shuffled pool dealer values are drawn from when it is
//! active). Both start as the full domain and shrink independently: the
//! deck when a dealer value is drawn, the hand only when a turn resolves.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{CardValue, GameRng, Seat, SeatMap, ValueSet};

/// One seat's hand and deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCards {
    pub hand: ValueSet,
    /// Draw pool; the top is the back.
    pub deck: Vector<CardValue>,
}

/// Hands and decks for both seats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStore {
    seats: SeatMap<SeatCards>,
}

impl HandStore {
    /// Full hands and freshly shuffled decks for both seats.
    #[must_use]
    pub fn shuffled(rng: &mut GameRng) -> Self {
        let mut store = Self {
            seats: SeatMap::from_fn(|_| SeatCards {
                hand: ValueSet::full(),
                deck: Vector::new(),
            }),
        };
        store.reshuffle(rng);
        store
    }

    /// Reset both hands to the full domain and reshuffle both decks.
    pub fn reshuffle(&mut self, rng: &mut GameRng) {
        for seat in Seat::BOTH {
            let mut deck: Vec<CardValue> = CardValue::all().collect();
            rng.shuffle(&mut deck);
            self.seats[seat] = SeatCards {
                hand: ValueSet::full(),
                deck: deck.into_iter().collect(),
            };
        }
    }

    /// A seat's remaining hand.
    #[must_use]
    pub fn hand(&self, seat: Seat) -> ValueSet {
        self.seats[seat].hand
    }

    /// Remaining draws in a seat's deck.
    #[must_use]
    pub fn deck_len(&self, seat: Seat) -> usize {
        self.seats[seat].deck.len()
    }

    /// Whether a seat can take the active role: something to play and a
    /// dealer value to draw.
    #[must_use]
    pub fn can_play(&self, seat: Seat) -> bool {
        !self.seats[seat].hand.is_empty() && !self.seats[seat].deck.is_empty()
    }

    /// Draw the next dealer value from a seat's deck.
    pub fn draw(&mut self, seat: Seat) -> Option<CardValue> {
        self.seats[seat].deck.pop_back()
    }

    /// Remove a played value from a seat's hand. Returns `false` if it was
    /// not there.
    pub fn consume(&mut self, seat: Seat, value: CardValue) -> bool {
        self.seats[seat].hand.remove(value)
    }

    /// Values consumed from both hands since the last reshuffle.
    #[must_use]
    pub fn consumed_total(&self) -> usize {
        Seat::BOTH
            .iter()
            .map(|&seat| ValueSet::full().len() - self.seats[seat].hand.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffled_starts_full() {
        let mut rng = GameRng::new(1);
        let store = HandStore::shuffled(&mut rng);

        for seat in Seat::BOTH {
            assert_eq!(store.hand(seat), ValueSet::full());
            assert_eq!(store.deck_len(seat), 11);
            assert!(store.can_play(seat));
        }
        assert_eq!(store.consumed_total(), 0);
    }

    #[test]
    fn test_draw_exhausts_deck_once_per_value() {
        let mut rng = GameRng::new(2);
        let mut store = HandStore::shuffled(&mut rng);

        let mut drawn: Vec<u8> = std::iter::from_fn(|| store.draw(Seat::A)).map(u8::from).collect();
        assert_eq!(drawn.len(), 11);
        drawn.sort_unstable();
        assert_eq!(drawn, (0..=10).collect::<Vec<u8>>());

        assert!(!store.can_play(Seat::A));
        assert_eq!(store.deck_len(Seat::B), 11);
    }

    #[test]
    fn test_consume_and_reshuffle() {
        let mut rng = GameRng::new(3);
        let mut store = HandStore::shuffled(&mut rng);
        let five = CardValue::new(5).unwrap();

        assert!(store.consume(Seat::B, five));
        assert!(!store.consume(Seat::B, five));
        assert_eq!(store.consumed_total(), 1);

        store.draw(Seat::A);
        store.reshuffle(&mut rng);
        assert_eq!(store.consumed_total(), 0);
        assert_eq!(store.deck_len(Seat::A), 11);
    }
}
