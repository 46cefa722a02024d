//! Deterministic random number generation for decks and bots.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical deck orders and bot play
//! - **Per-match streams**: `for_match` derives an independent stream per match
//! - **Serializable**: the match record stores `GameRngState`, so every
//!   conditional update restores the stream, draws, and writes it back
//!
//! ## Usage
//!
//! ```
//! use duel_engine::core::{GameRng, MatchId};
//!
//! let mut deck_rng = GameRng::for_match(42, MatchId::new(1));
//! let state = deck_rng.state();
//!
//! let first = deck_rng.gen_range_usize(0..11);
//! let mut replay = GameRng::from_state(&state);
//! assert_eq!(replay.gen_range_usize(0..11), first);
//! ```

use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use super::ids::MatchId;

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Derive the stream for one match from the engine seed.
    #[must_use]
    pub fn for_match(seed: u64, match_id: MatchId) -> Self {
        Self::new(seed).for_context(&format!("match:{}", match_id.raw()))
    }

    /// Create an independent stream for a named context.
    ///
    /// Uses `FxHasher`, which is stable across processes, so the derived
    /// stream is reproducible from a stored seed. The orchestrator derives
    /// its bot stream this way so bot play does not disturb the deck stream
    /// stored in the record.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform perturbation in `[-amplitude, amplitude]`.
    ///
    /// Returns exactly 0.0 when `amplitude` is not positive.
    pub fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.inner.gen_range(-amplitude..=amplitude)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state, stored inside the match record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Seed of the stream.
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter).
    pub word_pos: u128,
}
