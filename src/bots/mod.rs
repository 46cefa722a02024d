//! Bot strategies for unattended play.
//!
//! - `strategy`: the closed sets of active and guess strategies
//! - `strategist`: pure decision functions plus the SMART estimator

pub mod strategist;
pub mod strategy;

pub use strategist::{
    choose_active_value, fallback_guess, feasible_guesses, BotStrategist, BotView, GuessSet,
};
pub use strategy::{ActiveStrategy, GuessStrategy};
