//! Match lifecycle: start, advance, finish.
//!
//! Starting is idempotent per match id: the id is derived from the ordered
//! participant pair, and a second start with the same pair returns the
//! existing match untouched. Advancing delegates the rules to
//! `rules::progression` inside a conditional update and publishes one event
//! for whichever transition happened.

use serde::{Deserialize, Serialize};

use super::{Caller, DuelEngine};
use crate::core::{FinishReason, MatchId, MatchOutcome, MatchRecord, Participant, Seat, SeatMap, TurnView};
use crate::error::{EngineError, EngineResult};
use crate::events::MatchEvent;
use crate::rules::{self, Progression};
use crate::store::{Inserted, MatchStore};

/// Result of `advance_turn`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    /// A new turn is open.
    NextTurn(TurnView),
    /// The match is over.
    MatchEnded {
        outcome: MatchOutcome,
        reason: FinishReason,
    },
}

impl Advance {
    /// Whether the match ended.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Advance::MatchEnded { .. })
    }
}

impl<S: MatchStore> DuelEngine<S> {
    /// Start a match between `a` (seat A, active first) and `b`.
    ///
    /// Returns the existing id if this pair already has a match.
    pub fn start_match(&self, a: Participant, b: Participant) -> EngineResult<MatchId> {
        self.start_match_with_id(MatchId::for_pairing(a.id, b.id), a, b)
    }

    /// Start a match under a caller-assigned id.
    pub fn start_match_with_id(
        &self,
        match_id: MatchId,
        a: Participant,
        b: Participant,
    ) -> EngineResult<MatchId> {
        if a.id == b.id {
            return Err(EngineError::InvalidConfig(format!(
                "{} cannot face themselves",
                a.id
            )));
        }

        let record = MatchRecord::new(match_id, a, b, &self.config)?;
        match self.store.insert_if_absent(record)? {
            Inserted::Created(stored) => {
                let record = stored.record;
                tracing::info!(
                    %match_id,
                    seat_a = %a.id,
                    seat_b = %b.id,
                    dealer = %record.current.dealer_value,
                    "match started"
                );
                self.publish(MatchEvent::MatchStarted {
                    match_id,
                    participants: SeatMap::new(a.id, b.id),
                    view: record.turn_view(),
                });
            }
            Inserted::Existing(_) => {
                tracing::debug!(%match_id, "match already exists; start is a no-op");
            }
        }
        Ok(match_id)
    }

    /// Move past the resolved current turn.
    pub fn advance_turn(&self, match_id: MatchId) -> EngineResult<Advance> {
        let (progression, record) =
            self.conditional_update(match_id, |record| rules::advance(record, &self.config))?;

        let view = record.turn_view();
        let advance = match progression {
            Progression::Continued => {
                tracing::debug!(
                    %match_id,
                    turn = %view.turn,
                    active_seat = %record.active_seat,
                    "turn advanced"
                );
                self.publish(MatchEvent::TurnAdvanced { match_id, view: view.clone() });
                Advance::NextTurn(view)
            }
            Progression::SuddenDeath { pairing } => {
                tracing::info!(%match_id, pairing, turn = %view.turn, "sudden death");
                self.publish(MatchEvent::SuddenDeathEntered {
                    match_id,
                    pairing,
                    view: view.clone(),
                });
                Advance::NextTurn(view)
            }
            Progression::Finished { outcome, reason } => {
                self.announce_finish(&record, outcome, reason);
                Advance::MatchEnded { outcome, reason }
            }
        };
        Ok(advance)
    }

    /// End a running match early with an externally decided outcome.
    ///
    /// Facilitator only. A winner must be one of the match's participants.
    pub fn finish_match(
        &self,
        caller: Caller,
        match_id: MatchId,
        outcome: MatchOutcome,
    ) -> EngineResult<MatchOutcome> {
        caller.require_facilitator("finish a match")?;

        let (_, record) = self.conditional_update(match_id, |record| {
            if record.is_finished() {
                return Err(EngineError::MatchFinished(match_id));
            }
            if let MatchOutcome::Winner(participant) = outcome {
                if record.seat_of(participant).is_none() {
                    return Err(EngineError::UnknownParticipant { match_id, participant });
                }
            }
            record.finish(outcome, FinishReason::External);
            Ok(())
        })?;

        self.announce_finish(&record, outcome, FinishReason::External);
        Ok(outcome)
    }

    fn announce_finish(&self, record: &MatchRecord, outcome: MatchOutcome, reason: FinishReason) {
        let scores = record.scores.totals();
        tracing::info!(
            match_id = %record.id,
            ?outcome,
            ?reason,
            score_a = scores[Seat::A],
            score_b = scores[Seat::B],
            turns = record.turns_resolved,
            "match finished"
        );
        self.publish(MatchEvent::MatchFinished {
            match_id: record.id,
            outcome,
            reason,
        });
    }
}
