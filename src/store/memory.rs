//! In-process match arena.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;

use super::{Inserted, MatchStore, Swap, Versioned};
use crate::core::{MatchId, MatchRecord};
use crate::error::{EngineError, EngineResult};

/// Records held in memory behind a single reader-writer lock.
///
/// Each engine owns its store; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<FxHashMap<MatchId, Versioned<MatchRecord>>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<MatchId, Versioned<MatchRecord>>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("match store lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<MatchId, Versioned<MatchRecord>>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("match store lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl MatchStore for MemoryStore {
    fn insert_if_absent(&self, record: MatchRecord) -> EngineResult<Inserted> {
        let mut records = self.write();
        if let Some(existing) = records.get(&record.id) {
            return Ok(Inserted::Existing(existing.clone()));
        }
        let stored = Versioned { version: 1, record };
        records.insert(stored.record.id, stored.clone());
        Ok(Inserted::Created(stored))
    }

    fn load(&self, id: MatchId) -> EngineResult<Option<Versioned<MatchRecord>>> {
        Ok(self.read().get(&id).cloned())
    }

    fn compare_and_swap(&self, id: MatchId, expected: u64, record: MatchRecord) -> EngineResult<Swap> {
        if record.id != id {
            return Err(EngineError::Store(format!("record for {} written under {id}", record.id)));
        }

        let mut records = self.write();
        let slot = records.get_mut(&id).ok_or(EngineError::MatchNotFound(id))?;
        if slot.version != expected {
            return Ok(Swap::Conflict(slot.version));
        }
        slot.version += 1;
        slot.record = record;
        Ok(Swap::Committed(slot.version))
    }

    fn ids(&self) -> EngineResult<Vec<MatchId>> {
        Ok(self.read().keys().copied().collect())
    }
}
