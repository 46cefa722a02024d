//! Decision making for bot-controlled roles.
//!
//! ## Feasibility
//!
//! A guess is feasible when some card the active role could still play
//! would make it correct. Bots are allowed to see the active role's full
//! remaining hand: the engine, not a human opponent, is making the call.
//! When the hand is unknown or empty, only the domain bounds apply: nothing
//! is HIGHER than 10 and nothing is LOWER than 0.
//!
//! ## SMART estimates
//!
//! For HIGHER and LOWER the estimate is the average points won over the
//! opponent's hand minus `wrong_penalty` times the fraction of cards that
//! make the guess wrong. EQUAL uses the resolver's constants: the bonus
//! weighted by the chance of an exact match, minus the consolation weighted
//! by the chance of a miss. A small uniform jitter keeps play from being
//! fully predictable.

use smallvec::SmallVec;

use super::strategy::{ActiveStrategy, GuessStrategy};
use crate::core::config::{BotConfig, ScoringConfig};
use crate::core::{CardValue, Choice, GameRng, Guess, Role, ValueSet, MAX_VALUE};

/// Feasible guesses, in `Guess::ALL` order.
pub type GuessSet = SmallVec<[Guess; 3]>;

/// What a bot gets to see when deciding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotView {
    pub dealer_value: CardValue,
    /// The active seat's remaining hand. The active bot plays from it; the
    /// guesser bot reasons about it.
    pub active_hand: ValueSet,
}

/// Computes decisions for bot-controlled roles.
#[derive(Clone, Debug, Default)]
pub struct BotStrategist {
    scoring: ScoringConfig,
    tuning: BotConfig,
}

impl BotStrategist {
    /// Create a strategist using the resolver's scoring constants.
    #[must_use]
    pub fn new(scoring: ScoringConfig, tuning: BotConfig) -> Self {
        Self { scoring, tuning }
    }

    /// Decide for `role`. Returns `None` only when the active hand is empty.
    pub fn decide(
        &self,
        role: Role,
        active: ActiveStrategy,
        guess: GuessStrategy,
        view: &BotView,
        rng: &mut GameRng,
    ) -> Option<Choice> {
        match role {
            Role::Active => choose_active_value(view.active_hand, view.dealer_value, active, rng)
                .map(Choice::Value),
            Role::Guesser => Some(Choice::Guess(self.choose_guess(
                view.dealer_value,
                Some(&view.active_hand),
                guess,
                rng,
            ))),
        }
    }

    /// Pick a guess for the given dealer value.
    pub fn choose_guess(
        &self,
        dealer: CardValue,
        opponent_hand: Option<&ValueSet>,
        strategy: GuessStrategy,
        rng: &mut GameRng,
    ) -> Guess {
        match strategy {
            GuessStrategy::AlwaysEqual => Guess::Equal,
            GuessStrategy::Random => guess_random(dealer, opponent_hand, rng),
            GuessStrategy::Smart => self.guess_smart(dealer, opponent_hand, rng),
        }
    }

    fn guess_smart(&self, dealer: CardValue, opponent_hand: Option<&ValueSet>, rng: &mut GameRng) -> Guess {
        let hand = match opponent_hand {
            Some(hand) if !hand.is_empty() => hand,
            _ => return fallback_guess(dealer),
        };

        feasible_guesses(dealer, Some(hand))
            .into_iter()
            .map(|g| (g, self.estimate(dealer, hand, g) + rng.jitter(self.tuning.jitter)))
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(g, _)| g)
            .unwrap_or_else(|| fallback_guess(dealer))
    }

    /// Unperturbed expected value of `guess` against a known, non-empty hand.
    #[must_use]
    pub fn estimate(&self, dealer: CardValue, hand: &ValueSet, guess: Guess) -> f64 {
        let n = hand.len() as f64;
        if n == 0.0 {
            return 0.0;
        }

        match guess {
            Guess::Equal => {
                let p_eq = if hand.contains(dealer) { 1.0 / n } else { 0.0 };
                self.scoring.equal_bonus as f64 * p_eq - self.scoring.consolation as f64 * (1.0 - p_eq)
            }
            Guess::Higher | Guess::Lower => {
                let (gain, correct) = hand
                    .iter()
                    .filter(|&v| Guess::for_ordering(v.cmp(&dealer)) == guess)
                    .fold((0u32, 0usize), |(gain, count), v| (gain + v.distance(dealer), count + 1));
                let wrong = hand.len() - correct;
                gain as f64 / n - self.tuning.wrong_penalty * (wrong as f64 / n)
            }
        }
    }
}

// =============================================================================
// Active Value Selection
// =============================================================================

/// Pick the value to play as the active role.
///
/// Ties between equally close (or equally far) values go to the lower
/// value. Returns `None` for an empty hand.
pub fn choose_active_value(
    hand: ValueSet,
    dealer: CardValue,
    strategy: ActiveStrategy,
    rng: &mut GameRng,
) -> Option<CardValue> {
    match strategy {
        ActiveStrategy::Random => rng.choose(&hand.to_vec()).copied(),
        // `min_by_key` keeps the first minimum and the hand iterates
        // ascending, so ties resolve low.
        ActiveStrategy::Defensive => hand.iter().min_by_key(|v| v.distance(dealer)),
        ActiveStrategy::Aggressive => hand
            .iter()
            .map(|v| (v, v.distance(dealer)))
            .fold(None, |best: Option<(CardValue, u32)>, (v, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((v, d)),
            })
            .map(|(v, _)| v),
    }
}

// =============================================================================
// Guess Selection
// =============================================================================

/// Guesses that some playable card would make correct.
#[must_use]
pub fn feasible_guesses(dealer: CardValue, opponent_hand: Option<&ValueSet>) -> GuessSet {
    match opponent_hand {
        Some(hand) if !hand.is_empty() => Guess::ALL
            .into_iter()
            .filter(|g| match g {
                Guess::Higher => hand.count_above(dealer) > 0,
                Guess::Lower => hand.count_below(dealer) > 0,
                Guess::Equal => hand.contains(dealer),
            })
            .collect(),
        _ => Guess::ALL
            .into_iter()
            .filter(|g| match g {
                Guess::Higher => !dealer.is_max(),
                Guess::Lower => !dealer.is_min(),
                Guess::Equal => true,
            })
            .collect(),
    }
}

fn guess_random(dealer: CardValue, opponent_hand: Option<&ValueSet>, rng: &mut GameRng) -> Guess {
    let feasible = feasible_guesses(dealer, opponent_hand);
    rng.choose(&feasible).copied().unwrap_or_else(|| fallback_guess(dealer))
}

/// Dealer-relative heuristic: expect LOWER from a high dealer value and
/// HIGHER from a low one.
#[must_use]
pub fn fallback_guess(dealer: CardValue) -> Guess {
    if dealer.get() > MAX_VALUE / 2 {
        Guess::Lower
    } else {
        Guess::Higher
    }
}
