//! # duel-engine
//!
//! Turn engine for a two-seat card duel with hidden, simultaneous decisions.
//!
//! Each turn a dealer value is drawn from the active seat's deck. The active
//! role plays a value from its hand; the guesser calls HIGHER, LOWER or
//! EQUAL. Both decisions lock irreversibly, the resolver awards points to
//! exactly one role, and the roles swap for the next turn. A tied pairing
//! goes to sudden death with fresh hands.
//!
//! ## Design Principles
//!
//! 1. **Atomic transitions**: every mutation is a read, guard, and
//!    compare-and-swap against a versioned store. Races surface as typed
//!    rejections, never as double-applied scores.
//!
//! 2. **Rules as plain functions**: scoring and progression operate on a
//!    `MatchRecord` in place and know nothing about storage or tasks.
//!
//! 3. **Configuration over constants**: scoring, caps, retry budgets, and
//!    bot tuning come from `EngineConfig`.
//!
//! ## Architecture
//!
//! - **Persistent data structures**: history and decks are `im` vectors, so
//!   the clone taken by every conditional update is O(1).
//!
//! - **Deterministic randomness**: decks and bots draw from ChaCha streams
//!   derived from the config seed and the match id.
//!
//! ## Modules
//!
//! - `core`: ids, seats, values and guesses, RNG, configuration, match records
//! - `ledger`: scores, hands and decks, decision slots
//! - `rules`: resolution and turn progression
//! - `bots`: active and guess strategies
//! - `store`: versioned record storage
//! - `events`: state-transition events and publishers
//! - `engine`: the facade, authorization, scheduler, and orchestrator
//! - `error`: the error taxonomy
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use duel_engine::{
//!     CardValue, Choice, DuelEngine, EngineConfig, Guess, MemoryStore, NullPublisher,
//!     Participant, ParticipantId, Role,
//! };
//!
//! let engine = DuelEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     EngineConfig::default(),
//!     Arc::new(NullPublisher),
//! )
//! .unwrap();
//!
//! let id = engine
//!     .start_match(
//!         Participant::human(ParticipantId::new(1)),
//!         Participant::human(ParticipantId::new(2)),
//!     )
//!     .unwrap();
//!
//! let view = engine.turn_view(id).unwrap();
//! engine
//!     .submit_decision(id, view.turn, Role::Active, Choice::Value(CardValue::new(7).unwrap()))
//!     .unwrap();
//! engine
//!     .submit_decision(id, view.turn, Role::Guesser, Choice::Guess(Guess::Higher))
//!     .unwrap();
//!
//! let outcome = engine.resolve_turn(id, view.turn).unwrap();
//! assert!(outcome.applied());
//! ```

pub mod bots;
pub mod core;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod rules;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    CardValue, Choice, Control, EngineConfig, FinishReason, GameRng, Guess, MatchId,
    MatchOutcome, MatchRecord, MatchStatus, Participant, ParticipantId, Role, Seat, SeatMap,
    TurnId, TurnRecord, TurnView, ValueSet,
};

pub use crate::ledger::{Award, HandStore, ScoreLedger, Turn};

pub use crate::rules::{judge, ResolveOutcome, TurnResolution};

pub use crate::bots::{ActiveStrategy, BotStrategist, GuessStrategy};

pub use crate::store::{MatchStore, MemoryStore, StaleReadStore, Versioned};

pub use crate::events::{BroadcastPublisher, EventPublisher, MatchEvent, NullPublisher};

pub use crate::engine::{
    Acknowledged, Advance, AdvanceScheduler, Caller, DuelEngine, Orchestrator, Simulation,
    SimulationHandle, SimulationStep, SimulationSummary, StopReason, Submission,
};

pub use crate::error::{EngineError, EngineResult, ErrorKind};
