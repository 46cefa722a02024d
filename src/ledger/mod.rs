//! Bookkeeping for a match: scores, hands and decks, and decision slots.
//!
//! None of these types know the game's rules. The resolver decides who
//! scores and what is consumed; the controller decides when cards are
//! drawn and reshuffled.

pub mod decision;
pub mod hand;
pub mod score;

pub use decision::{Slot, Turn};
pub use hand::{HandStore, SeatCards};
pub use score::{Award, ScoreLedger};
