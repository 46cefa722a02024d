//! Game rules, kept free of storage and concurrency.
//!
//! - `resolver`: scores a locked turn and applies the award
//! - `progression`: moves a resolved match to its next turn or its end
//!
//! Both operate on a `MatchRecord` in place. The engine runs them inside a
//! conditional update, so a rejected call never reaches the store.

pub mod progression;
pub mod resolver;

pub use progression::{advance, Progression};
pub use resolver::{judge, resolve, ResolveOutcome, TurnResolution};
