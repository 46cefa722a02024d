//! State-transition events.
//!
//! The engine publishes exactly one `MatchEvent` per committed transition,
//! after the store accepted it. Publishing never fails an engine call:
//! a bus with no subscribers, or a subscriber that lags behind and drops
//! events, is the observer's problem. Observers that need exactly-once
//! handling de-duplicate on `(match_id, turn)`.
//!
//! ```
//! use duel_engine::events::{BroadcastPublisher, EventPublisher, MatchEvent};
//! use duel_engine::core::{MatchId, Role, TurnId};
//!
//! let bus = BroadcastPublisher::new(16);
//! let mut rx = bus.subscribe();
//! bus.publish(MatchEvent::DecisionUnlocked {
//!     match_id: MatchId::new(1),
//!     turn: TurnId::first(),
//!     role: Role::Guesser,
//! });
//! assert!(matches!(rx.try_recv(), Ok(MatchEvent::DecisionUnlocked { .. })));
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::{FinishReason, MatchId, MatchOutcome, ParticipantId, Role, SeatMap, TurnId, TurnView};
use crate::engine::SimulationSummary;
use crate::rules::TurnResolution;

/// One committed state transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchStarted {
        match_id: MatchId,
        participants: SeatMap<ParticipantId>,
        view: TurnView,
    },
    DecisionLocked {
        match_id: MatchId,
        turn: TurnId,
        role: Role,
    },
    /// A facilitator cleared a lock.
    DecisionUnlocked {
        match_id: MatchId,
        turn: TurnId,
        role: Role,
    },
    TurnResolved {
        match_id: MatchId,
        resolution: TurnResolution,
    },
    TurnAdvanced {
        match_id: MatchId,
        view: TurnView,
    },
    SuddenDeathEntered {
        match_id: MatchId,
        pairing: u32,
        view: TurnView,
    },
    MatchFinished {
        match_id: MatchId,
        outcome: MatchOutcome,
        reason: FinishReason,
    },
    SimulationStopped {
        match_id: MatchId,
        summary: SimulationSummary,
    },
}

impl MatchEvent {
    /// The match this event belongs to.
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        match self {
            MatchEvent::MatchStarted { match_id, .. }
            | MatchEvent::DecisionLocked { match_id, .. }
            | MatchEvent::DecisionUnlocked { match_id, .. }
            | MatchEvent::TurnResolved { match_id, .. }
            | MatchEvent::TurnAdvanced { match_id, .. }
            | MatchEvent::SuddenDeathEntered { match_id, .. }
            | MatchEvent::MatchFinished { match_id, .. }
            | MatchEvent::SimulationStopped { match_id, .. } => *match_id,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MatchEvent::MatchStarted { .. } => "match_started",
            MatchEvent::DecisionLocked { .. } => "decision_locked",
            MatchEvent::DecisionUnlocked { .. } => "decision_unlocked",
            MatchEvent::TurnResolved { .. } => "turn_resolved",
            MatchEvent::TurnAdvanced { .. } => "turn_advanced",
            MatchEvent::SuddenDeathEntered { .. } => "sudden_death_entered",
            MatchEvent::MatchFinished { .. } => "match_finished",
            MatchEvent::SimulationStopped { .. } => "simulation_stopped",
        }
    }
}

/// Sink for match events.
pub trait EventPublisher: Send + Sync {
    /// Deliver an event. Must not block and must not fail the caller.
    fn publish(&self, event: MatchEvent);
}

/// Publisher that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: MatchEvent) {}
}

/// Publisher backed by a `tokio::sync::broadcast` channel.
#[derive(Clone, Debug)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<MatchEvent>,
}

impl BroadcastPublisher {
    /// A bus that buffers up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// A new receiver that sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.tx.subscribe()
    }

    /// Current subscriber count.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: MatchEvent) {
        let name = event.name();
        let match_id = event.match_id();
        if self.tx.send(event).is_err() {
            tracing::trace!(%match_id, event = name, "no subscribers");
        }
    }
}
