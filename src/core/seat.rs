//! Seats, participants, and per-seat data storage.
//!
//! ## Seat
//!
//! A match has exactly two seats. Seat A opens as the active role; roles
//! rotate between seats every turn, so code that needs "who is active"
//! asks the match record rather than the seat.
//!
//! ## SeatMap
//!
//! Per-seat storage with O(1) indexing by `Seat`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use super::ids::ParticipantId;
use crate::bots::{ActiveStrategy, GuessStrategy};

/// One of the two seats in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    A,
    B,
}

impl Seat {
    /// Both seats, A first.
    pub const BOTH: [Seat; 2] = [Seat::A, Seat::B];

    /// The opposing seat.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }

    /// Index into per-seat storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Seat::A => 0,
            Seat::B => 1,
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seat::A => write!(f, "Seat A"),
            Seat::B => write!(f, "Seat B"),
        }
    }
}

/// Per-seat data storage.
///
/// ## Example
///
/// ```
/// use duel_engine::core::{Seat, SeatMap};
///
/// let mut points: SeatMap<u32> = SeatMap::with_value(0);
/// points[Seat::B] += 5;
/// assert_eq!(points[Seat::A], 0);
/// assert_eq!(points[Seat::B], 5);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: [T; 2],
}

impl<T> SeatMap<T> {
    /// Create from explicit values for A and B.
    pub const fn new(a: T, b: T) -> Self {
        Self { data: [a, b] }
    }

    /// Create with values from a factory function.
    pub fn from_fn(factory: impl Fn(Seat) -> T) -> Self {
        Self::new(factory(Seat::A), factory(Seat::B))
    }

    /// Create with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value)
    }

    /// Get a reference to a seat's data.
    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    /// Get a mutable reference to a seat's data.
    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        Seat::BOTH.into_iter().zip(self.data.iter())
    }

    /// Iterate over (Seat, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        Seat::BOTH.into_iter().zip(self.data.iter_mut())
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}

// =============================================================================
// Participants
// =============================================================================

/// Who makes decisions for a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Decisions arrive from a human client.
    Human,
    /// Decisions are computed by the bot strategist.
    Bot {
        active: ActiveStrategy,
        guess: GuessStrategy,
    },
}

impl Control {
    /// Whether this seat is driven by the bot strategist.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        matches!(self, Control::Bot { .. })
    }
}

/// A participant seated in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub control: Control,
}

impl Participant {
    /// A human-controlled participant.
    #[must_use]
    pub const fn human(id: ParticipantId) -> Self {
        Self {
            id,
            control: Control::Human,
        }
    }

    /// A bot-controlled participant.
    #[must_use]
    pub const fn bot(id: ParticipantId, active: ActiveStrategy, guess: GuessStrategy) -> Self {
        Self {
            id,
            control: Control::Bot { active, guess },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_basics() {
        assert_eq!(Seat::A.other(), Seat::B);
        assert_eq!(Seat::B.other(), Seat::A);
        assert_eq!(Seat::A.index(), 0);
        assert_eq!(Seat::B.index(), 1);
        assert_eq!(format!("{}", Seat::B), "Seat B");
    }

    #[test]
    fn test_seat_map_from_fn() {
        let map = SeatMap::from_fn(|s| s.index() * 10);
        assert_eq!(map[Seat::A], 0);
        assert_eq!(map[Seat::B], 10);
    }

    #[test]
    fn test_seat_map_mutation_and_iter() {
        let mut map: SeatMap<u32> = SeatMap::with_value(1);
        map[Seat::A] = 4;
        for (_, value) in map.iter_mut() {
            *value += 1;
        }
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(Seat::A, &5), (Seat::B, &2)]);
    }

    #[test]
    fn test_control_serialization() {
        let bot = Participant::bot(
            ParticipantId::new(3),
            ActiveStrategy::Defensive,
            GuessStrategy::Smart,
        );
        assert!(bot.control.is_bot());
        assert!(!Participant::human(ParticipantId::new(1)).control.is_bot());

        let json = serde_json::to_string(&bot).unwrap();
        let back: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(bot, back);
    }
}
