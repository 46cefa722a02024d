//! The match record: everything the engine knows about one match.
//!
//! ## MatchRecord
//!
//! One record per match, created at start and mutated by every turn. The
//! store hands out clones as snapshots, so the history and decks use `im`
//! persistent structures and cloning stays O(1).
//!
//! A finished record is never deleted. `to_snapshot` encodes it with
//! bincode for archival.
//!
//! ## Views
//!
//! `TurnView` is the public projection of the current turn: what observers
//! and step streams carry. It leaves out submitted values until the turn
//! resolves.

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};

use super::choice::{CardValue, Guess, Role};
use super::config::EngineConfig;
use super::ids::{MatchId, ParticipantId, TurnId};
use super::rng::{GameRng, GameRngState};
use super::seat::{Participant, Seat, SeatMap};
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Award, HandStore, ScoreLedger, Turn};

/// How a finished match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Winner(ParticipantId),
    Draw,
}

impl MatchOutcome {
    /// Check if a participant won.
    #[must_use]
    pub fn is_winner(&self, participant: ParticipantId) -> bool {
        matches!(self, MatchOutcome::Winner(p) if *p == participant)
    }
}

/// Why a match finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// A pairing ran out of turns or cards with one seat ahead.
    PairingExhausted,
    /// Every allowed sudden-death pairing ended level.
    SuddenDeathLimit,
    /// The match-wide turn cap was reached.
    MatchTurnCap,
    /// A higher-level win condition ended the match.
    External,
}

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Running,
    Finished {
        outcome: MatchOutcome,
        reason: FinishReason,
    },
}

/// A resolved turn, as kept in the match history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: TurnId,
    pub active_seat: Seat,
    pub dealer_value: CardValue,
    pub active_value: CardValue,
    pub guess: Guess,
    pub award: Award,
    pub resolved_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Seat that received the award.
    #[must_use]
    pub fn winning_seat(&self) -> Seat {
        match self.award.winner {
            Role::Active => self.active_seat,
            Role::Guesser => self.active_seat.other(),
        }
    }
}

/// Complete state of one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub participants: SeatMap<Participant>,
    pub status: MatchStatus,

    /// Resolve as soon as both roles lock.
    pub auto_resolve: bool,

    /// Seat holding the active role this turn; the other seat guesses.
    pub active_seat: Seat,

    pub cards: HandStore,
    pub scores: ScoreLedger,
    pub current: Turn,

    /// Resolved turns, oldest first.
    pub history: Vector<TurnRecord>,

    /// Resolved turns across every pairing.
    pub turns_resolved: u32,

    pub started_at: DateTime<Utc>,

    rng: GameRngState,
}

impl MatchRecord {
    /// Deal a new match: full hands, shuffled decks, seat A active, and the
    /// first dealer value drawn from seat A's deck.
    pub fn new(
        id: MatchId,
        a: Participant,
        b: Participant,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        let mut rng = GameRng::for_match(config.seed, id);
        let mut cards = HandStore::shuffled(&mut rng);
        let dealer = cards
            .draw(Seat::A)
            .ok_or_else(|| EngineError::Internal("fresh deck is empty".to_string()))?;

        Ok(Self {
            id,
            participants: SeatMap::new(a, b),
            status: MatchStatus::Running,
            auto_resolve: config.auto_resolve,
            active_seat: Seat::A,
            cards,
            scores: ScoreLedger::new(),
            current: Turn::open(TurnId::first(), dealer),
            history: Vector::new(),
            turns_resolved: 0,
            started_at: Utc::now(),
            rng: rng.state(),
        })
    }

    // === Accessors ===

    /// 1-based turn index within the current pairing.
    #[must_use]
    pub fn turn_index(&self) -> u32 {
        self.current.id.index
    }

    /// Sudden-death pairing index (0 = regular play).
    #[must_use]
    pub fn sudden_death_pairing(&self) -> u32 {
        self.current.id.pairing
    }

    /// Seat holding the guesser role this turn.
    #[must_use]
    pub fn guesser_seat(&self) -> Seat {
        self.active_seat.other()
    }

    /// Seat holding `role` this turn.
    #[must_use]
    pub fn seat_for(&self, role: Role) -> Seat {
        match role {
            Role::Active => self.active_seat,
            Role::Guesser => self.guesser_seat(),
        }
    }

    /// Role a seat holds this turn.
    #[must_use]
    pub fn role_of(&self, seat: Seat) -> Role {
        if seat == self.active_seat {
            Role::Active
        } else {
            Role::Guesser
        }
    }

    /// Seat of a participant, if they play in this match.
    #[must_use]
    pub fn seat_of(&self, participant: ParticipantId) -> Option<Seat> {
        self.participants
            .iter()
            .find(|(_, p)| p.id == participant)
            .map(|(seat, _)| seat)
    }

    /// Participant holding `role` this turn.
    #[must_use]
    pub fn participant_for(&self, role: Role) -> &Participant {
        &self.participants[self.seat_for(role)]
    }

    /// Whether the match has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Finished { .. })
    }

    /// The outcome, once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        match self.status {
            MatchStatus::Finished { outcome, .. } => Some(outcome),
            MatchStatus::Running => None,
        }
    }

    /// Current public view of the turn.
    #[must_use]
    pub fn turn_view(&self) -> TurnView {
        TurnView::of(self)
    }

    // === Mutation helpers ===

    /// Run `f` with the record's RNG stream, persisting its new position.
    pub(crate) fn with_rng<T>(&mut self, f: impl FnOnce(&mut GameRng, &mut HandStore) -> T) -> T {
        let mut rng = GameRng::from_state(&self.rng);
        let out = f(&mut rng, &mut self.cards);
        self.rng = rng.state();
        out
    }

    /// The outcome implied by the current scores.
    pub(crate) fn standing(&self) -> MatchOutcome {
        match self.scores.leader() {
            Some(seat) => MatchOutcome::Winner(self.participants[seat].id),
            None => MatchOutcome::Draw,
        }
    }

    pub(crate) fn finish(&mut self, outcome: MatchOutcome, reason: FinishReason) {
        self.status = MatchStatus::Finished { outcome, reason };
    }

    // === Snapshots ===

    /// Encode the record with bincode.
    pub fn to_snapshot(&self) -> EngineResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a record produced by `to_snapshot`.
    pub fn from_snapshot(bytes: &[u8]) -> EngineResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Public projection of the current turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub match_id: MatchId,
    pub turn: TurnId,
    pub dealer_value: CardValue,
    pub active: ParticipantId,
    pub guesser: ParticipantId,
    pub active_locked: bool,
    pub guesser_locked: bool,
    pub resolved: bool,
    pub award: Option<Award>,
    pub scores: SeatMap<u32>,
}

impl TurnView {
    /// Project the record's current turn.
    #[must_use]
    pub fn of(record: &MatchRecord) -> Self {
        Self {
            match_id: record.id,
            turn: record.current.id,
            dealer_value: record.current.dealer_value,
            active: record.participant_for(Role::Active).id,
            guesser: record.participant_for(Role::Guesser).id,
            active_locked: record.current.is_locked(Role::Active),
            guesser_locked: record.current.is_locked(Role::Guesser),
            resolved: record.current.resolved,
            award: record.current.award,
            scores: record.scores.totals(),
        }
    }
}
