//! Per-turn decision slots with irreversible locks.
//!
//! A `Turn` holds one slot per role. A submission writes the value and sets
//! the lock in the same mutation; there is no separate lock step and no
//! retract path. Once a slot is locked, further submissions for that role
//! are rejected rather than overwriting it.
//!
//! Rejections are checked in this order: turn already resolved, role
//! already locked, then choice legality. A late submission to a closed turn
//! therefore reports `TurnClosed` even if the value has since left the hand.
//!
//! The active role's value is validated against its hand but not removed
//! from it here; the resolver consumes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::score::Award;
use crate::core::{CardValue, Choice, Guess, MatchId, Role, TurnId, ValueSet};
use crate::error::{EngineError, EngineResult};

/// A decision slot: an optional committed value plus its lock flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot<T> {
    value: Option<T>,
    locked: bool,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            locked: false,
        }
    }
}

impl<T: Copy> Slot<T> {
    /// The committed value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.value
    }

    /// Whether the slot is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Write and lock in one step. Returns `false` if already locked.
    fn commit(&mut self, value: T) -> bool {
        if self.locked {
            return false;
        }
        self.value = Some(value);
        self.locked = true;
        true
    }

    /// Clear a locked slot. Returns `false` if it was not locked.
    fn clear(&mut self) -> bool {
        if !self.locked {
            return false;
        }
        *self = Self::default();
        true
    }
}

/// One round of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    /// Reference value drawn from the active seat's deck.
    pub dealer_value: CardValue,
    pub active: Slot<CardValue>,
    pub guess: Slot<Guess>,
    /// Flips false→true exactly once.
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub award: Option<Award>,
}

impl Turn {
    /// A fresh, unlocked turn.
    #[must_use]
    pub fn open(id: TurnId, dealer_value: CardValue) -> Self {
        Self {
            id,
            dealer_value,
            active: Slot::default(),
            guess: Slot::default(),
            resolved: false,
            resolved_at: None,
            award: None,
        }
    }

    /// Whether `role` has committed this turn.
    #[must_use]
    pub fn is_locked(&self, role: Role) -> bool {
        match role {
            Role::Active => self.active.is_locked(),
            Role::Guesser => self.guess.is_locked(),
        }
    }

    /// Both roles locked: eligible for resolution.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.active.is_locked() && self.guess.is_locked()
    }

    /// Roles that have not committed yet, active first.
    #[must_use]
    pub fn pending_roles(&self) -> SmallVec<[Role; 2]> {
        Role::BOTH.into_iter().filter(|&r| !self.is_locked(r)).collect()
    }

    /// Commit a decision for `role`.
    ///
    /// `active_hand` is the active seat's current hand, used to validate
    /// active submissions.
    pub fn submit(
        &mut self,
        match_id: MatchId,
        role: Role,
        choice: Choice,
        active_hand: ValueSet,
    ) -> EngineResult<()> {
        if self.resolved {
            return Err(EngineError::TurnClosed { match_id, turn: self.id });
        }
        if self.is_locked(role) {
            return Err(EngineError::AlreadyLocked {
                match_id,
                turn: self.id,
                role,
            });
        }

        let committed = match (role, choice) {
            (Role::Active, Choice::Value(value)) => {
                if !active_hand.contains(value) {
                    return Err(EngineError::invalid_choice(
                        role,
                        format!("{value} is not in the remaining hand"),
                    ));
                }
                self.active.commit(value)
            }
            (Role::Guesser, Choice::Guess(guess)) => self.guess.commit(guess),
            (Role::Active, Choice::Guess(guess)) => {
                return Err(EngineError::invalid_choice(
                    role,
                    format!("expected a card value, got {guess}"),
                ));
            }
            (Role::Guesser, Choice::Value(value)) => {
                return Err(EngineError::invalid_choice(
                    role,
                    format!("expected HIGHER, LOWER or EQUAL, got {value}"),
                ));
            }
        };

        debug_assert!(committed, "lock was checked above");
        Ok(())
    }

    /// Clear a locked, unresolved slot. Facilitator override only.
    pub fn unlock(&mut self, match_id: MatchId, role: Role) -> EngineResult<()> {
        if self.resolved {
            return Err(EngineError::TurnClosed { match_id, turn: self.id });
        }
        let cleared = match role {
            Role::Active => self.active.clear(),
            Role::Guesser => self.guess.clear(),
        };
        if cleared {
            Ok(())
        } else {
            Err(EngineError::invalid_choice(role, "nothing is locked to unlock"))
        }
    }

    /// The locked pair, if both roles have committed.
    #[must_use]
    pub fn locked_pair(&self) -> Option<(CardValue, Guess)> {
        match (self.active.value(), self.guess.value()) {
            (Some(value), Some(guess)) if self.is_ready() => Some((value, guess)),
            _ => None,
        }
    }

    pub(crate) fn mark_resolved(&mut self, award: Award, at: DateTime<Utc>) {
        self.resolved = true;
        self.resolved_at = Some(at);
        self.award = Some(award);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: MatchId = MatchId::new(1);

    fn v(value: u8) -> CardValue {
        CardValue::new(value).unwrap()
    }

    fn turn() -> Turn {
        Turn::open(TurnId::first(), v(5))
    }

    #[test]
    fn test_open_turn_is_unlocked() {
        let t = turn();
        assert!(!t.is_ready());
        assert_eq!(t.pending_roles().as_slice(), &[Role::Active, Role::Guesser]);
        assert!(t.locked_pair().is_none());
    }

    #[test]
    fn test_submit_locks_each_role_once() {
        let mut t = turn();
        let hand = ValueSet::full();

        t.submit(M, Role::Active, Choice::Value(v(3)), hand).unwrap();
        assert!(t.is_locked(Role::Active));
        assert_eq!(t.pending_roles().as_slice(), &[Role::Guesser]);

        let err = t.submit(M, Role::Active, Choice::Value(v(4)), hand).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyLocked { role: Role::Active, .. }));
        assert_eq!(t.active.value(), Some(v(3)), "second submission must not overwrite");

        t.submit(M, Role::Guesser, Choice::Guess(Guess::Lower), hand).unwrap();
        assert!(t.is_ready());
        assert_eq!(t.locked_pair(), Some((v(3), Guess::Lower)));
    }

    #[test]
    fn test_submit_rejects_value_outside_hand() {
        let mut t = turn();
        let hand = ValueSet::from_values(&[1, 2]);

        let err = t.submit(M, Role::Active, Choice::Value(v(9)), hand).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChoice { role: Role::Active, .. }));
        assert!(!t.is_locked(Role::Active));
    }

    #[test]
    fn test_submit_rejects_wrong_choice_kind() {
        let mut t = turn();
        let hand = ValueSet::full();

        assert!(matches!(
            t.submit(M, Role::Active, Choice::Guess(Guess::Equal), hand),
            Err(EngineError::InvalidChoice { .. })
        ));
        assert!(matches!(
            t.submit(M, Role::Guesser, Choice::Value(v(1)), hand),
            Err(EngineError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_submit_after_resolution_is_closed() {
        let mut t = turn();
        t.mark_resolved(Award { winner: Role::Active, points: 1 }, Utc::now());

        let err = t
            .submit(M, Role::Guesser, Choice::Guess(Guess::Higher), ValueSet::full())
            .unwrap_err();
        assert!(matches!(err, EngineError::TurnClosed { .. }));
    }

    #[test]
    fn test_unlock() {
        let mut t = turn();
        assert!(t.unlock(M, Role::Guesser).is_err());

        t.submit(M, Role::Guesser, Choice::Guess(Guess::Higher), ValueSet::full()).unwrap();
        t.unlock(M, Role::Guesser).unwrap();
        assert!(!t.is_locked(Role::Guesser));
        assert_eq!(t.guess.value(), None);

        t.submit(M, Role::Guesser, Choice::Guess(Guess::Lower), ValueSet::full()).unwrap();
        assert_eq!(t.guess.value(), Some(Guess::Lower));
    }
}
