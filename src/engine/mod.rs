//! The engine facade.
//!
//! `DuelEngine` ties the store, the rules, and the event bus together.
//! Every mutating operation is a conditional update:
//!
//! 1. load the record and its version;
//! 2. run the guard and the mutation on a clone;
//! 3. compare-and-swap the clone against the version read in step 1.
//!
//! A lost swap re-reads and re-runs the guard, so a retried operation
//! always sees the state it is about to overwrite. After `cas_retries`
//! lost swaps the call fails with `ConcurrencyConflict`. Guards that
//! reject on a read which turns out to be out of date are re-run as well;
//! only a rejection confirmed against the latest visible version reaches
//! the caller.
//!
//! ## Modules
//!
//! - `authz`: `Caller` and permission checks
//! - `controller`: match lifecycle (start, advance, finish)
//! - `turns`: submissions, resolution, and facilitator unlock
//! - `orchestrator`: unattended bot play on tokio
//! - `scheduler`: delayed automatic advancement

pub mod authz;
pub mod controller;
pub mod orchestrator;
pub mod scheduler;
pub mod turns;

pub use authz::Caller;
pub use controller::Advance;
pub use orchestrator::{
    Acknowledged, Orchestrator, Simulation, SimulationHandle, SimulationStep, SimulationSteps,
    SimulationSummary, StopReason, Tick,
};
pub use scheduler::AdvanceScheduler;
pub use turns::Submission;

use std::sync::Arc;

use crate::bots::BotStrategist;
use crate::core::{EngineConfig, MatchId, MatchRecord, TurnView};
use crate::error::{EngineError, EngineResult};
use crate::events::{EventPublisher, MatchEvent};
use crate::store::{MatchStore, Swap};

/// Engine over a match store.
///
/// Cheap to clone; clones share the store, config, and publisher.
pub struct DuelEngine<S> {
    store: Arc<S>,
    config: Arc<EngineConfig>,
    publisher: Arc<dyn EventPublisher>,
    strategist: BotStrategist,
}

impl<S> Clone for DuelEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            publisher: Arc::clone(&self.publisher),
            strategist: self.strategist.clone(),
        }
    }
}

impl<S: MatchStore> DuelEngine<S> {
    /// Create an engine. Fails if the config does not validate.
    pub fn new(
        store: Arc<S>,
        config: EngineConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let strategist = BotStrategist::new(config.scoring.clone(), config.bots.clone());
        Ok(Self {
            store,
            config: Arc::new(config),
            publisher,
            strategist,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The strategist configured with this engine's scoring and tuning.
    pub fn strategist(&self) -> &BotStrategist {
        &self.strategist
    }

    // === Reads ===

    /// The current record.
    pub fn snapshot(&self, match_id: MatchId) -> EngineResult<MatchRecord> {
        self.store
            .load(match_id)?
            .map(|v| v.record)
            .ok_or(EngineError::MatchNotFound(match_id))
    }

    /// Public view of the current turn.
    pub fn turn_view(&self, match_id: MatchId) -> EngineResult<TurnView> {
        Ok(self.snapshot(match_id)?.turn_view())
    }

    /// Bincode snapshot of a finished match, for archival.
    pub fn export_record(&self, match_id: MatchId) -> EngineResult<Vec<u8>> {
        let record = self.snapshot(match_id)?;
        if !record.is_finished() {
            return Err(EngineError::Store(format!("{match_id} is still running")));
        }
        record.to_snapshot()
    }

    // === Conditional update ===

    /// Apply `f` to the record atomically.
    ///
    /// `f` receives a clone of the latest record and either mutates it and
    /// returns a value, or rejects with an error. An `Ok` that leaves the
    /// record unchanged skips the write.
    pub fn conditional_update<T>(
        &self,
        match_id: MatchId,
        mut f: impl FnMut(&mut MatchRecord) -> EngineResult<T>,
    ) -> EngineResult<(T, MatchRecord)> {
        let attempts = self.config.cas_retries;
        let load = || {
            self.store
                .load(match_id)?
                .ok_or(EngineError::MatchNotFound(match_id))
        };

        let mut current = load()?;
        for attempt in 1..=attempts {
            let mut next = current.record.clone();

            let out = match f(&mut next) {
                Ok(out) => out,
                Err(err) => {
                    // Only a newer version can overturn a guard rejection.
                    let latest = load()?;
                    if latest.version <= current.version {
                        return Err(err);
                    }
                    tracing::debug!(%match_id, attempt, "guard rejected an outdated read; retrying");
                    current = latest;
                    continue;
                }
            };

            if next == current.record {
                return Ok((out, next));
            }

            match self.store.compare_and_swap(match_id, current.version, next.clone())? {
                Swap::Committed(_) => return Ok((out, next)),
                Swap::Conflict(seen) => {
                    tracing::debug!(
                        %match_id,
                        attempt,
                        expected = current.version,
                        seen,
                        "lost update race; retrying"
                    );
                    current = load()?;
                }
            }
        }

        tracing::warn!(%match_id, attempts, "conditional update gave up");
        Err(EngineError::ConcurrencyConflict { match_id, attempts })
    }

    fn publish(&self, event: MatchEvent) {
        tracing::trace!(match_id = %event.match_id(), event = event.name(), "publish");
        self.publisher.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Participant, ParticipantId};
    use crate::events::NullPublisher;
    use crate::store::MemoryStore;

    fn engine() -> DuelEngine<MemoryStore> {
        DuelEngine::new(
            Arc::new(MemoryStore::new()),
            EngineConfig::default(),
            Arc::new(NullPublisher),
        )
        .unwrap()
    }

    fn start(engine: &DuelEngine<MemoryStore>) -> MatchId {
        engine
            .start_match(
                Participant::human(ParticipantId::new(1)),
                Participant::human(ParticipantId::new(2)),
            )
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = DuelEngine::new(
            Arc::new(MemoryStore::new()),
            EngineConfig::default().with_turns_per_pairing(0),
            Arc::new(NullPublisher),
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_snapshot_of_unknown_match() {
        let err = engine().snapshot(MatchId::new(404)).unwrap_err();
        assert!(matches!(err, EngineError::MatchNotFound(_)));
    }

    #[test]
    fn test_conditional_update_commits_and_bumps_version() {
        let engine = engine();
        let id = start(&engine);

        let (out, record) = engine
            .conditional_update(id, |r| {
                r.auto_resolve = true;
                Ok(7)
            })
            .unwrap();
        assert_eq!(out, 7);
        assert!(record.auto_resolve);
        assert_eq!(engine.store().load(id).unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_conditional_update_noop_skips_write() {
        let engine = engine();
        let id = start(&engine);
        engine.conditional_update(id, |_| Ok(())).unwrap();
        assert_eq!(engine.store().load(id).unwrap().unwrap().version, 1);
    }

    #[test]
    fn test_conditional_update_error_leaves_record() {
        let engine = engine();
        let id = start(&engine);
        let before = engine.snapshot(id).unwrap();

        let err = engine
            .conditional_update(id, |r| -> EngineResult<()> {
                r.turns_resolved = 99;
                Err(EngineError::MatchFinished(r.id))
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::MatchFinished(_)));
        assert_eq!(engine.snapshot(id).unwrap(), before);
    }

    #[test]
    fn test_conditional_update_retries_after_interference() {
        let engine = engine();
        let id = start(&engine);
        let store = Arc::clone(engine.store());

        let mut calls = 0;
        let (_, record) = engine
            .conditional_update(id, |r| {
                calls += 1;
                if calls == 1 {
                    // Another writer sneaks in between our read and our swap.
                    let mut other = store.load(id).unwrap().unwrap();
                    other.record.turns_resolved = 5;
                    store.compare_and_swap(id, other.version, other.record).unwrap();
                }
                r.auto_resolve = true;
                Ok(())
            })
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(record.turns_resolved, 5, "retry must build on the other write");
        assert!(record.auto_resolve);
    }

    #[test]
    fn test_guard_error_survives_alternating_stale_reads() {
        use crate::store::StaleReadStore;

        let engine = DuelEngine::new(
            Arc::new(StaleReadStore::new(MemoryStore::new(), 2)),
            EngineConfig::default(),
            Arc::new(NullPublisher),
        )
        .unwrap();
        let id = engine
            .start_match(
                Participant::human(ParticipantId::new(1)),
                Participant::human(ParticipantId::new(2)),
            )
            .unwrap();
        engine.conditional_update(id, |r| {
            r.auto_resolve = true;
            Ok(())
        })
        .unwrap();

        for _ in 0..4 {
            let err = engine
                .conditional_update(id, |r| -> EngineResult<()> {
                    if r.auto_resolve {
                        Err(EngineError::MatchFinished(r.id))
                    } else {
                        r.auto_resolve = true;
                        Ok(())
                    }
                })
                .unwrap_err();
            assert!(matches!(err, EngineError::MatchFinished(_)), "got {err:?}");
        }
        assert!(engine.store().stale_reads() > 0);
    }

    #[test]
    fn test_export_requires_finished_match() {
        let engine = engine();
        let id = start(&engine);
        assert!(matches!(engine.export_record(id), Err(EngineError::Store(_))));
    }
}
