//! Engine configuration.
//!
//! Everything the engine treats as policy lives here: scoring constants,
//! pairing caps, sudden-death limits, retry budgets, bot tuning, and
//! simulation bounds. Configs deserialize from JSON with every field
//! optional; missing fields take the defaults below.
//!
//! ```
//! use duel_engine::core::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "seed": 9, "scoring": { "equal_bonus": 12 } }"#).unwrap();
//! assert_eq!(config.seed, 9);
//! assert_eq!(config.scoring.equal_bonus, 12);
//! assert_eq!(config.scoring.consolation, 2);
//! assert_eq!(config.turns_per_pairing, 10);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Points awarded by the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Awarded to a guesser who calls EQUAL on an exact match.
    pub equal_bonus: u32,
    /// Awarded to the active role on an exact match the guesser missed.
    pub consolation: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            equal_bonus: 10,
            consolation: 2,
        }
    }
}

/// Tuning for the SMART guess strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Weight applied to the fraction of opponent cards that make a guess wrong.
    pub wrong_penalty: f64,
    /// Amplitude of the uniform perturbation added to each estimate.
    pub jitter: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            wrong_penalty: 2.0,
            jitter: 0.25,
        }
    }
}

/// Bounds for unattended simulation runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard cap on loop iterations, independent of the requested turn count.
    pub hard_iteration_cap: u32,
    /// Consecutive conflicts tolerated before a run gives up.
    pub conflict_retries: u32,
    /// Wait between iterations while a human decision is pending.
    pub poll_interval_ms: u64,
    /// Capacity of the step stream channel.
    pub step_buffer: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hard_iteration_cap: 10_000,
            conflict_retries: 16,
            poll_interval_ms: 50,
            step_buffer: 64,
        }
    }
}

impl SimulationConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root seed; each match derives its own stream from it.
    pub seed: u64,

    /// Turns in the regular pairing before it is considered exhausted.
    pub turns_per_pairing: u32,

    /// Turns in each sudden-death pairing.
    pub sudden_death_turns: u32,

    /// Sudden-death pairings played before a tie is declared a draw.
    pub max_sudden_death_pairings: u32,

    /// Optional cap on resolved turns across the whole match.
    pub match_turn_cap: Option<u32>,

    /// Attempts a conditional update makes before reporting a conflict.
    pub cas_retries: u32,

    /// Default for a new match's `auto_resolve` flag.
    pub auto_resolve: bool,

    pub scoring: ScoringConfig,
    pub bots: BotConfig,
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            turns_per_pairing: 10,
            sudden_death_turns: 2,
            max_sudden_death_pairings: 5,
            match_turn_cap: None,
            cas_retries: 8,
            auto_resolve: false,
            scoring: ScoringConfig::default(),
            bots: BotConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.turns_per_pairing == 0 {
            return fail("turns_per_pairing must be > 0");
        }
        if self.sudden_death_turns == 0 {
            return fail("sudden_death_turns must be > 0");
        }
        if self.match_turn_cap == Some(0) {
            return fail("match_turn_cap must be > 0 when set");
        }
        if self.scoring.equal_bonus == 0 {
            return fail("scoring.equal_bonus must be > 0");
        }
        if self.scoring.consolation == 0 {
            return fail("scoring.consolation must be > 0");
        }
        if self.cas_retries == 0 {
            return fail("cas_retries must be > 0");
        }
        if self.simulation.hard_iteration_cap == 0 {
            return fail("simulation.hard_iteration_cap must be > 0");
        }
        if self.simulation.step_buffer == 0 {
            return fail("simulation.step_buffer must be > 0");
        }
        if !self.bots.jitter.is_finite() || self.bots.jitter < 0.0 {
            return fail("bots.jitter must be a finite non-negative number");
        }
        if !self.bots.wrong_penalty.is_finite() {
            return fail("bots.wrong_penalty must be finite");
        }
        Ok(())
    }

    /// Set the root seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set turns per regular pairing.
    pub fn with_turns_per_pairing(mut self, turns: u32) -> Self {
        self.turns_per_pairing = turns;
        self
    }

    /// Set turns per sudden-death pairing.
    pub fn with_sudden_death_turns(mut self, turns: u32) -> Self {
        self.sudden_death_turns = turns;
        self
    }

    /// Set the sudden-death limit.
    pub fn with_max_sudden_death_pairings(mut self, pairings: u32) -> Self {
        self.max_sudden_death_pairings = pairings;
        self
    }

    /// Cap resolved turns across the whole match.
    pub fn with_match_turn_cap(mut self, cap: u32) -> Self {
        self.match_turn_cap = Some(cap);
        self
    }

    /// Set the default auto-resolve flag for new matches.
    pub fn with_auto_resolve(mut self, auto_resolve: bool) -> Self {
        self.auto_resolve = auto_resolve;
        self
    }

    /// Set the hard iteration cap for simulations.
    pub fn with_hard_iteration_cap(mut self, cap: u32) -> Self {
        self.simulation.hard_iteration_cap = cap;
        self
    }

    /// Set the SMART jitter amplitude.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.bots.jitter = jitter;
        self
    }

    /// Turn cap for the given pairing index.
    #[must_use]
    pub fn pairing_cap(&self, pairing: u32) -> u32 {
        if pairing == 0 {
            self.turns_per_pairing
        } else {
            self.sudden_death_turns
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.scoring.equal_bonus, 10);
        assert_eq!(config.scoring.consolation, 2);
        assert_eq!(config.turns_per_pairing, 10);
        assert_eq!(config.pairing_cap(0), 10);
        assert_eq!(config.pairing_cap(3), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_seed(123)
            .with_turns_per_pairing(4)
            .with_match_turn_cap(20)
            .with_hard_iteration_cap(50)
            .with_jitter(0.0);

        assert_eq!(config.seed, 123);
        assert_eq!(config.turns_per_pairing, 4);
        assert_eq!(config.match_turn_cap, Some(20));
        assert_eq!(config.simulation.hard_iteration_cap, 50);
        assert_eq!(config.bots.jitter, 0.0);
    }

    #[test]
    fn test_validation_rejects_zero_caps() {
        let err = EngineConfig::default().with_turns_per_pairing(0).validate().unwrap_err();
        assert!(err.to_string().contains("turns_per_pairing"), "unexpected error: {err}");

        let err = EngineConfig::default().with_match_turn_cap(0).validate().unwrap_err();
        assert!(err.to_string().contains("match_turn_cap"), "unexpected error: {err}");

        let err = EngineConfig::default().with_jitter(-0.5).validate().unwrap_err();
        assert!(err.to_string().contains("jitter"), "unexpected error: {err}");
    }

    #[test]
    fn test_validation_rejects_zero_scoring() {
        let mut config = EngineConfig::default();
        config.scoring.consolation = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert!(err.to_string().contains("consolation"), "unexpected error: {err}");

        let mut config = EngineConfig::default();
        config.scoring.equal_bonus = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("equal_bonus"), "unexpected error: {err}");

        let err = EngineConfig::from_json_str(r#"{ "scoring": { "consolation": 0 } }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "simulation": { "poll_interval_ms": 5 } }"#).unwrap();
        assert_eq!(config.simulation.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.simulation.hard_iteration_cap, 10_000);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "turns_per_pairing": 6 }"#).unwrap();

        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.turns_per_pairing, 6);

        let missing = EngineConfig::from_path(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig::default().with_seed(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
