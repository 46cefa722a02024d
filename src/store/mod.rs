//! Match storage with atomic conditional updates.
//!
//! ## Contract
//!
//! A store keeps one versioned `MatchRecord` per match id. Versions start
//! at 1 on insert and increase by one on every successful swap. Writers
//! never overwrite blindly: `compare_and_swap` only succeeds when the
//! caller's expected version is still current. The engine builds its
//! read-guard-write loop on top of this.
//!
//! Reads may be stale (see `StaleReadStore`). A stale read can only lose a
//! later swap, never corrupt the record.
//!
//! ## Implementations
//!
//! - `MemoryStore`: a process-local arena.
//! - `StaleReadStore`: wraps another store and sometimes serves the
//!   previous version, to exercise retry paths.

pub mod memory;
pub mod stale;

pub use memory::MemoryStore;
pub use stale::StaleReadStore;

use crate::core::{MatchId, MatchRecord};
use crate::error::EngineResult;

/// A record together with the version it was read at.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

/// Result of `insert_if_absent`.
#[derive(Clone, Debug, PartialEq)]
pub enum Inserted {
    /// The record was stored at version 1.
    Created(Versioned<MatchRecord>),
    /// A record with that id already existed; it is returned unchanged.
    Existing(Versioned<MatchRecord>),
}

impl Inserted {
    /// The stored record, whichever branch was taken.
    #[must_use]
    pub fn into_versioned(self) -> Versioned<MatchRecord> {
        match self {
            Inserted::Created(v) | Inserted::Existing(v) => v,
        }
    }
}

/// Result of `compare_and_swap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Swap {
    /// The record was replaced; this is its new version.
    Committed(u64),
    /// The expected version was stale; this is the current one.
    Conflict(u64),
}

/// Versioned record storage.
pub trait MatchStore: Send + Sync + 'static {
    /// Store `record` unless its id is already present.
    fn insert_if_absent(&self, record: MatchRecord) -> EngineResult<Inserted>;

    /// Read a record and its version.
    fn load(&self, id: MatchId) -> EngineResult<Option<Versioned<MatchRecord>>>;

    /// Replace the record if it is still at `expected`.
    fn compare_and_swap(&self, id: MatchId, expected: u64, record: MatchRecord) -> EngineResult<Swap>;

    /// Every stored match id, in no particular order.
    fn ids(&self) -> EngineResult<Vec<MatchId>>;
}
