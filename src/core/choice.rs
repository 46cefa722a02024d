//! Card values, hands, roles, and the choices each role submits.
//!
//! Values live in the closed domain `0..=10`. A hand is a set of distinct
//! values, stored as a bitmask so that cloning a record is a copy.
//!
//! The active role submits a `CardValue` from its hand. The guesser submits
//! a `Guess` about how that value compares to the dealer value. Both travel
//! through the engine as a `Choice`.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest value in the domain.
pub const MIN_VALUE: u8 = 0;

/// Largest value in the domain.
pub const MAX_VALUE: u8 = 10;

/// Number of distinct values in a fresh hand.
pub const DOMAIN_SIZE: usize = (MAX_VALUE - MIN_VALUE + 1) as usize;

// =============================================================================
// Card Values
// =============================================================================

/// A playable value in `0..=10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CardValue(u8);

impl CardValue {
    /// Create a value, returning `None` outside the domain.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= MAX_VALUE {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the raw value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Absolute distance to another value.
    #[must_use]
    pub const fn distance(self, other: CardValue) -> u32 {
        self.0.abs_diff(other.0) as u32
    }

    /// Whether this is the top of the domain.
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 == MAX_VALUE
    }

    /// Whether this is the bottom of the domain.
    #[must_use]
    pub const fn is_min(self) -> bool {
        self.0 == MIN_VALUE
    }

    /// Iterate over every value in the domain, ascending.
    pub fn all() -> impl Iterator<Item = CardValue> {
        (MIN_VALUE..=MAX_VALUE).map(CardValue)
    }
}

impl TryFrom<u8> for CardValue {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CardValue::new(value).ok_or_else(|| format!("value {value} outside {MIN_VALUE}..={MAX_VALUE}"))
    }
}

impl From<CardValue> for u8 {
    fn from(value: CardValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for CardValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Value Sets
// =============================================================================

/// A set of distinct card values, backed by an 11-bit mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSet(u16);

impl ValueSet {
    const FULL_MASK: u16 = (1 << DOMAIN_SIZE) - 1;

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The full domain `0..=10`.
    #[must_use]
    pub const fn full() -> Self {
        Self(Self::FULL_MASK)
    }

    /// Build a set from raw values, ignoring anything outside the domain.
    #[must_use]
    pub fn from_values(values: &[u8]) -> Self {
        values
            .iter()
            .filter_map(|&v| CardValue::new(v))
            .fold(Self::empty(), |mut set, v| {
                set.insert(v);
                set
            })
    }

    /// Check membership.
    #[must_use]
    pub const fn contains(&self, value: CardValue) -> bool {
        self.0 & (1 << value.0) != 0
    }

    /// Add a value. Returns `true` if it was not already present.
    pub fn insert(&mut self, value: CardValue) -> bool {
        let fresh = !self.contains(value);
        self.0 |= 1 << value.0;
        fresh
    }

    /// Remove a value. Returns `true` if it was present.
    pub fn remove(&mut self, value: CardValue) -> bool {
        let present = self.contains(value);
        self.0 &= !(1 << value.0);
        present
    }

    /// Number of values in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the values, ascending.
    pub fn iter(&self) -> impl Iterator<Item = CardValue> + '_ {
        CardValue::all().filter(move |v| self.contains(*v))
    }

    /// Collect the values into a vector, ascending.
    #[must_use]
    pub fn to_vec(&self) -> Vec<CardValue> {
        self.iter().collect()
    }

    /// Count values strictly above `pivot`.
    #[must_use]
    pub fn count_above(&self, pivot: CardValue) -> usize {
        self.iter().filter(|v| *v > pivot).count()
    }

    /// Count values strictly below `pivot`.
    #[must_use]
    pub fn count_below(&self, pivot: CardValue) -> usize {
        self.iter().filter(|v| *v < pivot).count()
    }
}

impl FromIterator<CardValue> for ValueSet {
    fn from_iter<I: IntoIterator<Item = CardValue>>(iter: I) -> Self {
        let mut set = Self::empty();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

// =============================================================================
// Roles and Guesses
// =============================================================================

/// The two roles of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Plays a value from hand.
    Active,
    /// Predicts how the played value compares to the dealer value.
    Guesser,
}

impl Role {
    /// Both roles, active first.
    pub const BOTH: [Role; 2] = [Role::Active, Role::Guesser];

    /// The opposing role.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Role::Active => Role::Guesser,
            Role::Guesser => Role::Active,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Active => write!(f, "active"),
            Role::Guesser => write!(f, "guesser"),
        }
    }
}

/// A guesser's prediction about the active value relative to the dealer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Guess {
    Higher,
    Lower,
    Equal,
}

impl Guess {
    /// Every guess, in a fixed order.
    pub const ALL: [Guess; 3] = [Guess::Higher, Guess::Lower, Guess::Equal];

    /// The guess that is correct for a given comparison of active to dealer.
    #[must_use]
    pub const fn for_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Guess::Higher,
            Ordering::Less => Guess::Lower,
            Ordering::Equal => Guess::Equal,
        }
    }
}

impl std::fmt::Display for Guess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guess::Higher => write!(f, "HIGHER"),
            Guess::Lower => write!(f, "LOWER"),
            Guess::Equal => write!(f, "EQUAL"),
        }
    }
}

impl FromStr for Guess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "higher" => Ok(Guess::Higher),
            "lower" => Ok(Guess::Lower),
            "equal" => Ok(Guess::Equal),
            other => Err(format!("unrecognized guess token: {other}")),
        }
    }
}

/// A submitted decision, tagged by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// A card value (active role).
    Value(CardValue),
    /// A prediction (guesser role).
    Guess(Guess),
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::Value(v) => write!(f, "value {v}"),
            Choice::Guess(g) => write!(f, "guess {g}"),
        }
    }
}
