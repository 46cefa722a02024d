//! Turn resolution: the scoring rule and its all-or-nothing application.
//!
//! `judge` is the pure rule. `resolve` applies it to a match record: it
//! flips the resolved flag, adds the single delta to the score ledger,
//! removes the played value from the active hand, and appends the turn to
//! the history. Every precondition is checked before the first write, so
//! an error leaves the record exactly as it was.
//!
//! `resolve` runs inside the engine's conditional update. If another caller
//! resolved the turn first, the guard sees `resolved == true` on re-read
//! and reports `AlreadyResolved` without touching the scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::config::ScoringConfig;
use crate::core::{CardValue, Guess, MatchId, MatchRecord, Role, SeatMap, TurnId, TurnRecord};
use crate::error::{EngineError, EngineResult};
use crate::ledger::Award;

/// Score a locked turn.
///
/// With `d = |active - dealer|`:
/// - exact match: EQUAL earns the guesser `equal_bonus`, anything else
///   earns the active role `consolation`;
/// - otherwise the guesser earns `d` for the right direction, and the
///   active role earns `d` for any wrong call (including EQUAL).
#[must_use]
pub fn judge(dealer: CardValue, active: CardValue, guess: Guess, scoring: &ScoringConfig) -> Award {
    let correct = Guess::for_ordering(active.cmp(&dealer));

    if correct == Guess::Equal {
        return if guess == Guess::Equal {
            Award { winner: Role::Guesser, points: scoring.equal_bonus }
        } else {
            Award { winner: Role::Active, points: scoring.consolation }
        };
    }

    let points = active.distance(dealer);
    let winner = if guess == correct { Role::Guesser } else { Role::Active };
    Award { winner, points }
}

/// A resolved turn together with the scores it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResolution {
    pub match_id: MatchId,
    pub turn: TurnRecord,
    /// Cumulative scores when this resolution was read.
    pub scores: SeatMap<u32>,
}

/// Result of a resolve call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// This call flipped the turn and applied the award.
    Resolved(TurnResolution),
    /// Someone else already did; nothing was applied.
    AlreadyResolved(TurnResolution),
}

impl ResolveOutcome {
    /// The resolution, whoever applied it.
    #[must_use]
    pub fn resolution(&self) -> &TurnResolution {
        match self {
            ResolveOutcome::Resolved(r) | ResolveOutcome::AlreadyResolved(r) => r,
        }
    }

    /// Whether this call applied the award.
    #[must_use]
    pub fn applied(&self) -> bool {
        matches!(self, ResolveOutcome::Resolved(_))
    }
}

/// Resolve `turn` on `record` if, and only if, it is locked and unresolved.
pub fn resolve(
    record: &mut MatchRecord,
    turn: TurnId,
    scoring: &ScoringConfig,
    now: DateTime<Utc>,
) -> EngineResult<ResolveOutcome> {
    let match_id = record.id;

    if turn != record.current.id {
        return match record.history.iter().rev().find(|t| t.turn == turn) {
            Some(past) => Ok(ResolveOutcome::AlreadyResolved(TurnResolution {
                match_id,
                turn: past.clone(),
                scores: record.scores.totals(),
            })),
            None => Err(EngineError::StaleTurn {
                match_id,
                requested: turn,
                current: record.current.id,
            }),
        };
    }

    if record.current.resolved {
        if let Some(last) = record.history.last() {
            if last.turn == turn {
                return Ok(ResolveOutcome::AlreadyResolved(TurnResolution {
                    match_id,
                    turn: last.clone(),
                    scores: record.scores.totals(),
                }));
            }
        }
        return Err(EngineError::TurnClosed { match_id, turn });
    }

    if record.is_finished() {
        return Err(EngineError::MatchFinished(match_id));
    }

    let (active_value, guess) = match record.current.locked_pair() {
        Some(pair) => pair,
        None => {
            let missing = record.current.pending_roles().first().copied().unwrap_or(Role::Active);
            return Err(EngineError::TurnNotReady { match_id, turn, missing });
        }
    };

    let active_seat = record.active_seat;
    if !record.cards.hand(active_seat).contains(active_value) {
        return Err(EngineError::invalid_choice(
            Role::Active,
            format!("{active_value} is no longer in the hand"),
        ));
    }

    // All checks passed; from here every write succeeds.
    let dealer_value = record.current.dealer_value;
    let award = judge(dealer_value, active_value, guess, scoring);

    record.scores.apply(record.seat_for(award.winner), award.points);
    record.cards.consume(active_seat, active_value);
    record.current.mark_resolved(award, now);
    record.turns_resolved += 1;

    let entry = TurnRecord {
        turn,
        active_seat,
        dealer_value,
        active_value,
        guess,
        award,
        resolved_at: now,
    };
    record.history.push_back(entry.clone());

    Ok(ResolveOutcome::Resolved(TurnResolution {
        match_id,
        turn: entry,
        scores: record.scores.totals(),
    }))
}
