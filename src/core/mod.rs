//! Core engine types: ids, seats, values, RNG, configuration, match records.
//!
//! Everything here is plain data plus small helpers. Rules live in `rules`,
//! lifecycle in `engine`.

pub mod choice;
pub mod config;
pub mod ids;
pub mod rng;
pub mod seat;
pub mod state;

pub use choice::{CardValue, Choice, Guess, Role, ValueSet, DOMAIN_SIZE, MAX_VALUE, MIN_VALUE};
pub use config::{BotConfig, EngineConfig, ScoringConfig, SimulationConfig};
pub use ids::{MatchId, ParticipantId, TurnId};
pub use rng::{GameRng, GameRngState};
pub use seat::{Control, Participant, Seat, SeatMap};
pub use state::{FinishReason, MatchOutcome, MatchRecord, MatchStatus, TurnRecord, TurnView};
