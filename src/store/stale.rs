//! A store wrapper that serves stale reads.
//!
//! Every `stale_every`-th load of a match returns the version that was
//! current before the most recent change the wrapper has observed. Writes
//! pass straight through, so a swap based on a stale read loses the
//! compare and the caller has to re-read. Staleness is bounded to one
//! version.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use super::{Inserted, MatchStore, Swap, Versioned};
use crate::core::{MatchId, MatchRecord};
use crate::error::EngineResult;

#[derive(Debug, Default)]
struct Seen {
    previous: Option<Versioned<MatchRecord>>,
    latest: Option<Versioned<MatchRecord>>,
}

/// Wraps a store and periodically serves the previous version of a record.
#[derive(Debug)]
pub struct StaleReadStore<S> {
    inner: S,
    stale_every: u64,
    reads: AtomicU64,
    stale_reads: AtomicU64,
    seen: Mutex<FxHashMap<MatchId, Seen>>,
}

impl<S: MatchStore> StaleReadStore<S> {
    /// Serve a stale read on every `stale_every`-th load. Values below 2
    /// are raised to 2 so fresh reads always interleave.
    #[must_use]
    pub fn new(inner: S, stale_every: u64) -> Self {
        Self {
            inner,
            stale_every: stale_every.max(2),
            reads: AtomicU64::new(0),
            stale_reads: AtomicU64::new(0),
            seen: Mutex::new(FxHashMap::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// How many loads returned an out-of-date version.
    pub fn stale_reads(&self) -> u64 {
        self.stale_reads.load(Ordering::Relaxed)
    }
}

impl<S: MatchStore> MatchStore for StaleReadStore<S> {
    fn insert_if_absent(&self, record: MatchRecord) -> EngineResult<Inserted> {
        self.inner.insert_if_absent(record)
    }

    fn load(&self, id: MatchId) -> EngineResult<Option<Versioned<MatchRecord>>> {
        let fresh = match self.inner.load(id)? {
            Some(fresh) => fresh,
            None => return Ok(None),
        };

        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("stale-read tracker lock poisoned; recovering");
                poisoned.into_inner()
            }
        };
        let entry = seen.entry(id).or_default();
        let newer = entry.latest.as_ref().map_or(true, |l| l.version < fresh.version);
        if newer {
            entry.previous = entry.latest.replace(fresh.clone());
        }

        let n = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.stale_every == 0 {
            if let Some(previous) = entry.previous.clone() {
                self.stale_reads.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(match_id = %id, version = previous.version, "serving stale read");
                return Ok(Some(previous));
            }
        }
        Ok(Some(fresh))
    }

    fn compare_and_swap(&self, id: MatchId, expected: u64, record: MatchRecord) -> EngineResult<Swap> {
        self.inner.compare_and_swap(id, expected, record)
    }

    fn ids(&self) -> EngineResult<Vec<MatchId>> {
        self.inner.ids()
    }
}
