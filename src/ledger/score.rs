//! Cumulative scores and per-turn awards.

use serde::{Deserialize, Serialize};

use crate::core::{Role, Seat, SeatMap};

/// The single delta produced by resolving a turn.
///
/// Exactly one role receives points; the other receives zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub winner: Role,
    pub points: u32,
}

impl Award {
    /// Points awarded to `role` by this turn.
    #[must_use]
    pub const fn points_for(&self, role: Role) -> u32 {
        if matches!(
            (self.winner, role),
            (Role::Active, Role::Active) | (Role::Guesser, Role::Guesser)
        ) {
            self.points
        } else {
            0
        }
    }
}

/// Cumulative points per seat. Totals only ever grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    totals: SeatMap<u32>,
}

impl ScoreLedger {
    /// A ledger with both seats at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points to a seat.
    pub fn apply(&mut self, seat: Seat, points: u32) {
        self.totals[seat] = self.totals[seat].saturating_add(points);
    }

    /// Current total for a seat.
    #[must_use]
    pub fn total(&self, seat: Seat) -> u32 {
        self.totals[seat]
    }

    /// Both totals.
    #[must_use]
    pub fn totals(&self) -> SeatMap<u32> {
        self.totals
    }

    /// The seat strictly ahead, if any.
    #[must_use]
    pub fn leader(&self) -> Option<Seat> {
        let (a, b) = (self.totals[Seat::A], self.totals[Seat::B]);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Seat::A),
            std::cmp::Ordering::Less => Some(Seat::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Whether both seats have the same total.
    #[must_use]
    pub fn is_tied(&self) -> bool {
        self.leader().is_none()
    }
}
