//! Engine error taxonomy.
//!
//! Every rejection is a structured `EngineError`. `EngineError::kind`
//! groups variants into the categories callers branch on: validation
//! failures are the caller's fault, state conflicts describe a turn or
//! match that has moved on, and concurrency conflicts mean "re-read and
//! retry".
//!
//! Deck or hand exhaustion never appears here; the controller absorbs it
//! with a sudden-death reshuffle. A simulation hitting its iteration cap is
//! a stop reason, not an error.

use thiserror::Error;

use crate::core::{MatchId, ParticipantId, Role, TurnId};

/// Broad error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Illegal or infeasible input.
    Validation,
    /// The turn or match is not in a state that permits the operation.
    StateConflict,
    /// Lost a race with another writer, or acted on a stale read.
    ConcurrencyConflict,
    /// The match does not exist.
    NotFound,
    /// The caller is not permitted to perform the operation.
    Forbidden,
    /// Storage or encoding failure.
    Internal,
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid choice for {role}: {reason}")]
    InvalidChoice { role: Role, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{participant} does not play in {match_id}")]
    UnknownParticipant {
        match_id: MatchId,
        participant: ParticipantId,
    },

    #[error("{turn} of {match_id} is already resolved")]
    TurnClosed { match_id: MatchId, turn: TurnId },

    #[error("{role} is already locked for {turn} of {match_id}")]
    AlreadyLocked {
        match_id: MatchId,
        turn: TurnId,
        role: Role,
    },

    #[error("{turn} of {match_id} is not resolved yet")]
    TurnNotResolved { match_id: MatchId, turn: TurnId },

    #[error("{turn} of {match_id} is waiting on the {missing} decision")]
    TurnNotReady {
        match_id: MatchId,
        turn: TurnId,
        missing: Role,
    },

    #[error("{0} is finished")]
    MatchFinished(MatchId),

    #[error("a simulation is already running for {0}")]
    SimulationRunning(MatchId),

    #[error("stale turn for {match_id}: requested {requested}, current {current}")]
    StaleTurn {
        match_id: MatchId,
        requested: TurnId,
        current: TurnId,
    },

    #[error("lost the update race on {match_id} after {attempts} attempts")]
    ConcurrencyConflict { match_id: MatchId, attempts: u32 },

    #[error("{0} not found")]
    MatchNotFound(MatchId),

    #[error("{caller} may not {action}")]
    Forbidden { caller: String, action: &'static str },

    #[error("store error: {0}")]
    Store(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl EngineError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidChoice { .. }
            | EngineError::InvalidConfig(_)
            | EngineError::UnknownParticipant { .. } => ErrorKind::Validation,
            EngineError::TurnClosed { .. }
            | EngineError::AlreadyLocked { .. }
            | EngineError::TurnNotResolved { .. }
            | EngineError::TurnNotReady { .. }
            | EngineError::MatchFinished(_)
            | EngineError::SimulationRunning(_) => ErrorKind::StateConflict,
            EngineError::StaleTurn { .. } | EngineError::ConcurrencyConflict { .. } => {
                ErrorKind::ConcurrencyConflict
            }
            EngineError::MatchNotFound(_) => ErrorKind::NotFound,
            EngineError::Forbidden { .. } => ErrorKind::Forbidden,
            EngineError::Store(_) | EngineError::Snapshot(_) | EngineError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether a caller should re-read state and try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrencyConflict
    }

    pub(crate) fn invalid_choice(role: Role, reason: impl Into<String>) -> Self {
        EngineError::InvalidChoice {
            role,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let m = MatchId::new(1);
        let t = TurnId::first();

        assert_eq!(EngineError::invalid_choice(Role::Active, "x").kind(), ErrorKind::Validation);
        assert_eq!(
            EngineError::AlreadyLocked { match_id: m, turn: t, role: Role::Guesser }.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(EngineError::MatchFinished(m).kind(), ErrorKind::StateConflict);
        assert_eq!(EngineError::MatchNotFound(m).kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::Store("down".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_retryable() {
        let m = MatchId::new(1);
        assert!(EngineError::ConcurrencyConflict { match_id: m, attempts: 3 }.is_retryable());
        assert!(EngineError::StaleTurn {
            match_id: m,
            requested: TurnId::first(),
            current: TurnId::new(0, 2),
        }
        .is_retryable());
        assert!(!EngineError::TurnClosed { match_id: m, turn: TurnId::first() }.is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = EngineError::AlreadyLocked {
            match_id: MatchId::new(255),
            turn: TurnId::new(0, 3),
            role: Role::Active,
        };
        assert_eq!(err.to_string(), "active is already locked for Turn 3 of Match(00000000000000ff)");
    }
}
