//! Identifiers for participants, matches, and turns.
//!
//! ## Match identity
//!
//! A `MatchId` is derived deterministically from the ordered participant
//! pair, so starting the same pairing twice addresses the same record.
//! Callers that allocate their own ids use `MatchId::new`.
//!
//! ## Turn identity
//!
//! Turn numbering restarts for every sudden-death pairing, so a `TurnId`
//! carries both the pairing index and the 1-based turn index. The pair is
//! unique within a match.
//!
//! ```
//! use duel_engine::core::{MatchId, ParticipantId, TurnId};
//!
//! let a = ParticipantId::new(7);
//! let b = ParticipantId::new(9);
//! assert_eq!(MatchId::for_pairing(a, b), MatchId::for_pairing(a, b));
//! assert_ne!(MatchId::for_pairing(a, b), MatchId::for_pairing(b, a));
//!
//! let first = TurnId::first();
//! assert_eq!(first.next(), TurnId::new(0, 2));
//! assert_eq!(first.sudden_death(1), TurnId::new(1, 1));
//! ```

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Identifier of a participant (human or bot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    /// Create a new participant ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Participant({})", self.0)
    }
}

/// Identifier of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u64);

impl MatchId {
    /// Create a match ID from a caller-assigned value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derive the match ID for an ordered participant pair.
    ///
    /// Order matters: the first participant is seat A and opens the match
    /// as the active role.
    #[must_use]
    pub fn for_pairing(a: ParticipantId, b: ParticipantId) -> Self {
        let mut hasher = FxHasher::default();
        "duel-match".hash(&mut hasher);
        a.0.hash(&mut hasher);
        b.0.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Match({:016x})", self.0)
    }
}

/// Identifier of a turn within a match.
///
/// Ordered by pairing first, then by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnId {
    /// Sudden-death pairing index (0 = regular play).
    pub pairing: u32,
    /// 1-based turn index within the pairing.
    pub index: u32,
}

impl TurnId {
    /// Create a turn ID.
    #[must_use]
    pub const fn new(pairing: u32, index: u32) -> Self {
        Self { pairing, index }
    }

    /// The opening turn of a match.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(0, 1)
    }

    /// The following turn in the same pairing.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.pairing, self.index + 1)
    }

    /// The opening turn of the given sudden-death pairing.
    #[must_use]
    pub const fn sudden_death(self, pairing: u32) -> Self {
        Self::new(pairing, 1)
    }

    /// Whether this turn belongs to a sudden-death pairing.
    #[must_use]
    pub const fn is_sudden_death(self) -> bool {
        self.pairing > 0
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pairing == 0 {
            write!(f, "Turn {}", self.index)
        } else {
            write!(f, "Turn {} (sudden death {})", self.index, self.pairing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_is_stable_per_pairing() {
        let a = ParticipantId::new(1);
        let b = ParticipantId::new(2);

        assert_eq!(MatchId::for_pairing(a, b), MatchId::for_pairing(a, b));
        assert_ne!(MatchId::for_pairing(a, b), MatchId::for_pairing(b, a));
        assert_ne!(
            MatchId::for_pairing(a, b),
            MatchId::for_pairing(a, ParticipantId::new(3))
        );
    }

    #[test]
    fn test_turn_id_progression() {
        let turn = TurnId::first();
        assert_eq!(turn, TurnId::new(0, 1));
        assert!(!turn.is_sudden_death());

        let later = turn.next().next();
        assert_eq!(later.index, 3);

        let sd = later.sudden_death(1);
        assert_eq!(sd, TurnId::new(1, 1));
        assert!(sd.is_sudden_death());
        assert!(sd > later);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ParticipantId::new(4)), "Participant(4)");
        assert_eq!(format!("{}", TurnId::new(0, 3)), "Turn 3");
        assert_eq!(format!("{}", TurnId::new(2, 1)), "Turn 1 (sudden death 2)");
    }

    #[test]
    fn test_serialization() {
        let turn = TurnId::new(1, 4);
        let json = serde_json::to_string(&turn).unwrap();
        let back: TurnId = serde_json::from_str(&json).unwrap();
        assert_eq!(turn, back);
    }
}
