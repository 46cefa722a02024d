//! Decision submission, resolution, and the facilitator unlock.
//!
//! A submission names the turn it is meant for. If that is no longer the
//! current turn the call fails with `StaleTurn`, which callers treat like a
//! lost race: re-read and decide again.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Caller, DuelEngine};
use crate::core::{Choice, MatchId, MatchRecord, Role, TurnId, TurnView};
use crate::error::{EngineError, EngineResult};
use crate::events::MatchEvent;
use crate::rules::{self, ResolveOutcome, TurnResolution};
use crate::store::MatchStore;

/// Result of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub view: TurnView,
    /// Set when this submission completed the turn on an auto-resolving
    /// match and this caller's resolve was the one that applied.
    pub auto_resolved: Option<TurnResolution>,
}

fn ensure_current(record: &MatchRecord, turn: TurnId) -> EngineResult<()> {
    if record.is_finished() {
        return Err(EngineError::MatchFinished(record.id));
    }
    if record.current.id != turn {
        return Err(EngineError::StaleTurn {
            match_id: record.id,
            requested: turn,
            current: record.current.id,
        });
    }
    Ok(())
}

impl<S: MatchStore> DuelEngine<S> {
    /// Commit and lock a decision for `role` in `turn`.
    pub fn submit_decision(
        &self,
        match_id: MatchId,
        turn: TurnId,
        role: Role,
        choice: Choice,
    ) -> EngineResult<Submission> {
        self.submit_as(Caller::System, match_id, turn, role, choice)
    }

    /// `submit_decision` on behalf of `caller`.
    ///
    /// A participant may only submit for the role their seat holds in the
    /// current turn.
    pub fn submit_as(
        &self,
        caller: Caller,
        match_id: MatchId,
        turn: TurnId,
        role: Role,
        choice: Choice,
    ) -> EngineResult<Submission> {
        let result = self.conditional_update(match_id, |record| {
            ensure_current(record, turn)?;
            caller.require_role(record, role)?;
            let hand = record.cards.hand(record.active_seat);
            let id = record.id;
            record.current.submit(id, role, choice, hand)
        });

        let record = match result {
            Ok(((), record)) => record,
            Err(err) => {
                tracing::debug!(%match_id, %turn, %role, %caller, error = %err, "submission rejected");
                return Err(err);
            }
        };

        tracing::debug!(%match_id, %turn, %role, %caller, "decision locked");
        self.publish(MatchEvent::DecisionLocked { match_id, turn, role });

        let auto_resolved = if record.auto_resolve && record.current.is_ready() {
            match self.resolve_turn(match_id, turn) {
                Ok(ResolveOutcome::Resolved(resolution)) => Some(resolution),
                Ok(ResolveOutcome::AlreadyResolved(_)) => None,
                Err(err) if err.is_retryable() || matches!(err, EngineError::TurnClosed { .. }) => {
                    tracing::debug!(%match_id, %turn, error = %err, "auto-resolve lost the race");
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        let view = match &auto_resolved {
            Some(_) => self.turn_view(match_id)?,
            None => record.turn_view(),
        };
        Ok(Submission { view, auto_resolved })
    }

    /// Resolve `turn` if both roles are locked.
    ///
    /// Exactly one concurrent caller gets `Resolved`; the others get
    /// `AlreadyResolved` and nothing is applied twice.
    pub fn resolve_turn(&self, match_id: MatchId, turn: TurnId) -> EngineResult<ResolveOutcome> {
        let now = Utc::now();
        let (outcome, _) = self.conditional_update(match_id, |record| {
            rules::resolve(record, turn, &self.config.scoring, now)
        })?;

        if let ResolveOutcome::Resolved(resolution) = &outcome {
            let entry = &resolution.turn;
            tracing::info!(
                %match_id,
                %turn,
                dealer = %entry.dealer_value,
                active = %entry.active_value,
                guess = %entry.guess,
                role = %entry.award.winner,
                points = entry.award.points,
                "turn resolved"
            );
            self.publish(MatchEvent::TurnResolved {
                match_id,
                resolution: resolution.clone(),
            });
        } else {
            tracing::debug!(%match_id, %turn, "turn already resolved");
        }
        Ok(outcome)
    }

    /// Clear a locked, unresolved decision. Facilitator only.
    pub fn force_unlock(
        &self,
        caller: Caller,
        match_id: MatchId,
        turn: TurnId,
        role: Role,
    ) -> EngineResult<TurnView> {
        caller.require_facilitator("unlock a decision")?;

        let ((), record) = self.conditional_update(match_id, |record| {
            ensure_current(record, turn)?;
            let id = record.id;
            record.current.unlock(id, role)
        })?;

        tracing::warn!(%match_id, %turn, %role, "decision unlocked by facilitator");
        self.publish(MatchEvent::DecisionUnlocked { match_id, turn, role });
        Ok(record.turn_view())
    }
}
