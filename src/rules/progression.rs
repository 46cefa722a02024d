//! Turn progression: rotation, pairing exhaustion, sudden death, match end.
//!
//! `advance` moves a record with a resolved current turn to its next state.
//! Roles swap every turn, including the first turn of a sudden-death
//! pairing. A pairing is exhausted when its turn cap is reached or when the
//! seat about to become active has nothing to play or nothing to draw.
//! Exhaustion never surfaces as an error: a leader wins, a tie enters
//! sudden death with fresh hands and decks, and a tie after the last
//! allowed sudden death is a draw.

use serde::{Deserialize, Serialize};

use crate::core::{EngineConfig, FinishReason, MatchOutcome, MatchRecord, Seat, TurnId};
use crate::error::{EngineError, EngineResult};
use crate::ledger::Turn;

/// What `advance` did to the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    /// Next turn of the same pairing.
    Continued,
    /// A tied pairing ran out; a new sudden-death pairing opened.
    SuddenDeath { pairing: u32 },
    /// The match is over.
    Finished {
        outcome: MatchOutcome,
        reason: FinishReason,
    },
}

/// Advance past the resolved current turn.
pub fn advance(record: &mut MatchRecord, config: &EngineConfig) -> EngineResult<Progression> {
    if record.is_finished() {
        return Err(EngineError::MatchFinished(record.id));
    }
    if !record.current.resolved {
        return Err(EngineError::TurnNotResolved {
            match_id: record.id,
            turn: record.current.id,
        });
    }

    if let Some(cap) = config.match_turn_cap {
        if record.turns_resolved >= cap {
            return Ok(finish(record, FinishReason::MatchTurnCap));
        }
    }

    let incoming = record.active_seat.other();
    let pairing = record.sudden_death_pairing();
    let exhausted = record.turn_index() >= config.pairing_cap(pairing)
        || !record.cards.can_play(incoming);

    if !exhausted {
        let next = record.current.id.next();
        open_turn(record, incoming, next)?;
        return Ok(Progression::Continued);
    }

    if !record.scores.is_tied() {
        return Ok(finish(record, FinishReason::PairingExhausted));
    }
    if pairing >= config.max_sudden_death_pairings {
        return Ok(finish(record, FinishReason::SuddenDeathLimit));
    }

    let next_pairing = pairing + 1;
    record.with_rng(|rng, cards| cards.reshuffle(rng));
    let next = record.current.id.sudden_death(next_pairing);
    open_turn(record, incoming, next)?;
    Ok(Progression::SuddenDeath { pairing: next_pairing })
}

fn finish(record: &mut MatchRecord, reason: FinishReason) -> Progression {
    let outcome = record.standing();
    record.finish(outcome, reason);
    Progression::Finished { outcome, reason }
}

fn open_turn(record: &mut MatchRecord, active: Seat, id: TurnId) -> EngineResult<()> {
    let dealer = record
        .cards
        .draw(active)
        .ok_or_else(|| EngineError::Internal(format!("{active} has no dealer value to draw")))?;
    record.active_seat = active;
    record.current = Turn::open(id, dealer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Choice, Guess, MatchId, Participant, ParticipantId, Role};
    use crate::rules::resolver::resolve;
    use chrono::Utc;

    fn record(config: &EngineConfig) -> MatchRecord {
        MatchRecord::new(
            MatchId::new(3),
            Participant::human(ParticipantId::new(1)),
            Participant::human(ParticipantId::new(2)),
            config,
        )
        .unwrap()
    }

    /// Lock and resolve the current turn by playing the lowest value with
    /// the given guess.
    fn play(record: &mut MatchRecord, config: &EngineConfig, guess: Guess) {
        let hand = record.cards.hand(record.active_seat);
        let value = hand.iter().next().unwrap();
        let id = record.id;
        record.current.submit(id, Role::Active, Choice::Value(value), hand).unwrap();
        record.current.submit(id, Role::Guesser, Choice::Guess(guess), hand).unwrap();
        let turn = record.current.id;
        resolve(record, turn, &config.scoring, Utc::now()).unwrap();
    }

    #[test]
    fn test_advance_requires_resolution() {
        let config = EngineConfig::default();
        let mut r = record(&config);
        let err = advance(&mut r, &config).unwrap_err();
        assert!(matches!(err, EngineError::TurnNotResolved { .. }));
    }

    #[test]
    fn test_roles_swap_each_turn() {
        let config = EngineConfig::default();
        let mut r = record(&config);
        play(&mut r, &config, Guess::Higher);

        assert_eq!(advance(&mut r, &config).unwrap(), Progression::Continued);
        assert_eq!(r.active_seat, Seat::B);
        assert_eq!(r.current.id, TurnId::new(0, 2));
        assert_eq!(r.cards.deck_len(Seat::B), 10);
        assert!(!r.current.resolved);
    }

    #[test]
    fn test_pairing_cap_with_leader_finishes() {
        let config = EngineConfig::default().with_turns_per_pairing(1);
        let mut r = record(&config);
        // Force a non-zero award for someone.
        let hand = r.cards.hand(Seat::A);
        let dealer = r.current.dealer_value;
        r.current.submit(r.id, Role::Active, Choice::Value(dealer), hand).unwrap();
        r.current.submit(r.id, Role::Guesser, Choice::Guess(Guess::Equal), hand).unwrap();
        resolve(&mut r, TurnId::first(), &config.scoring, Utc::now()).unwrap();

        let progression = advance(&mut r, &config).unwrap();
        assert_eq!(
            progression,
            Progression::Finished {
                outcome: MatchOutcome::Winner(ParticipantId::new(2)),
                reason: FinishReason::PairingExhausted,
            }
        );
        assert!(r.is_finished());
        assert!(matches!(advance(&mut r, &config), Err(EngineError::MatchFinished(_))));
    }

    #[test]
    fn test_tie_enters_sudden_death_with_fresh_cards() {
        let config = EngineConfig::default().with_turns_per_pairing(1);
        let mut r = record(&config);
        // Every resolved turn pays someone; level the ledger by hand.
        play(&mut r, &config, Guess::Higher);
        r.scores = crate::ledger::ScoreLedger::new();

        let progression = advance(&mut r, &config).unwrap();
        assert_eq!(progression, Progression::SuddenDeath { pairing: 1 });
        assert_eq!(r.current.id, TurnId::new(1, 1));
        assert_eq!(r.active_seat, Seat::B);
        assert_eq!(r.cards.hand(Seat::A).len(), 11);
        assert_eq!(r.cards.deck_len(Seat::B), 10);
        assert_eq!(r.cards.deck_len(Seat::A), 11);
    }

    #[test]
    fn test_sudden_death_limit_is_a_draw() {
        let config = EngineConfig::default()
            .with_turns_per_pairing(1)
            .with_max_sudden_death_pairings(0);
        let mut r = record(&config);
        play(&mut r, &config, Guess::Higher);
        r.scores = crate::ledger::ScoreLedger::new();

        let progression = advance(&mut r, &config).unwrap();
        assert_eq!(
            progression,
            Progression::Finished {
                outcome: MatchOutcome::Draw,
                reason: FinishReason::SuddenDeathLimit,
            }
        );
    }

    #[test]
    fn test_match_turn_cap() {
        let config = EngineConfig::default().with_match_turn_cap(2);
        let mut r = record(&config);
        play(&mut r, &config, Guess::Higher);
        assert_eq!(advance(&mut r, &config).unwrap(), Progression::Continued);
        play(&mut r, &config, Guess::Higher);

        let progression = advance(&mut r, &config).unwrap();
        assert!(matches!(
            progression,
            Progression::Finished { reason: FinishReason::MatchTurnCap, .. }
        ));
    }

    #[test]
    fn test_empty_hand_exhausts_pairing() {
        let config = EngineConfig::default().with_turns_per_pairing(100);
        let mut r = record(&config);
        let mut turns = 0;
        loop {
            play(&mut r, &config, Guess::Higher);
            turns += 1;
            match advance(&mut r, &config).unwrap() {
                Progression::Continued => continue,
                _ => break,
            }
        }
        // Both seats play all eleven values, then seat A has nothing left.
        assert_eq!(turns, 22);
        assert!(r.cards.hand(Seat::A).is_empty());
    }
}
