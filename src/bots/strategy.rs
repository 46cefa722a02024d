//! Strategy definitions.
//!
//! Strategies are closed enums. Each variant maps to one pure function in
//! `strategist`, selected by an exhaustive `match`, so there is no default
//! branch for an unknown name. String parsing exists only at the edges
//! (config files and the CLI).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a bot picks the value it plays as the active role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStrategy {
    /// Uniform over the remaining hand.
    Random,
    /// Closest value to the dealer value, keeping any loss small.
    Defensive,
    /// Farthest value from the dealer value, maximizing the stake.
    Aggressive,
}

/// How a bot predicts as the guesser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessStrategy {
    /// Always EQUAL. A baseline; ignores feasibility.
    AlwaysEqual,
    /// Uniform over feasible guesses.
    Random,
    /// Argmax of a perturbed expected-value estimate.
    Smart,
}

impl FromStr for ActiveStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(ActiveStrategy::Random),
            "defensive" => Ok(ActiveStrategy::Defensive),
            "aggressive" => Ok(ActiveStrategy::Aggressive),
            other => Err(format!(
                "unknown active strategy '{other}' (expected random, defensive or aggressive)"
            )),
        }
    }
}

impl FromStr for GuessStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "always_equal" => Ok(GuessStrategy::AlwaysEqual),
            "random" => Ok(GuessStrategy::Random),
            "smart" => Ok(GuessStrategy::Smart),
            other => Err(format!(
                "unknown guess strategy '{other}' (expected always_equal, random or smart)"
            )),
        }
    }
}

impl std::fmt::Display for ActiveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActiveStrategy::Random => "random",
            ActiveStrategy::Defensive => "defensive",
            ActiveStrategy::Aggressive => "aggressive",
        };
        f.write_str(name)
    }
}

impl std::fmt::Display for GuessStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GuessStrategy::AlwaysEqual => "always_equal",
            GuessStrategy::Random => "random",
            GuessStrategy::Smart => "smart",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_active() {
        assert_eq!("Defensive".parse::<ActiveStrategy>().unwrap(), ActiveStrategy::Defensive);
        assert_eq!("aggressive".parse::<ActiveStrategy>().unwrap(), ActiveStrategy::Aggressive);
        assert!("cautious".parse::<ActiveStrategy>().is_err());
    }

    #[test]
    fn test_parse_guess() {
        assert_eq!("always-equal".parse::<GuessStrategy>().unwrap(), GuessStrategy::AlwaysEqual);
        assert_eq!("SMART".parse::<GuessStrategy>().unwrap(), GuessStrategy::Smart);
        assert!("psychic".parse::<GuessStrategy>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for s in [ActiveStrategy::Random, ActiveStrategy::Defensive, ActiveStrategy::Aggressive] {
            assert_eq!(s.to_string().parse::<ActiveStrategy>().unwrap(), s);
        }
        for s in [GuessStrategy::AlwaysEqual, GuessStrategy::Random, GuessStrategy::Smart] {
            assert_eq!(s.to_string().parse::<GuessStrategy>().unwrap(), s);
        }
    }
}
