//! Delayed automatic advancement.
//!
//! Used to leave a resolved turn on screen for a moment before the next one
//! opens. Each scheduled advance is its own tokio task; abort the returned
//! handle to cancel it.

use std::time::Duration;

use tokio::task::JoinHandle;

use super::{Advance, DuelEngine};
use crate::core::MatchId;
use crate::error::EngineError;
use crate::store::MatchStore;

/// Spawns delayed `advance_turn` calls.
pub struct AdvanceScheduler<S> {
    engine: DuelEngine<S>,
}

impl<S> Clone for AdvanceScheduler<S> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone() }
    }
}

impl<S: MatchStore> AdvanceScheduler<S> {
    pub fn new(engine: DuelEngine<S>) -> Self {
        Self { engine }
    }

    /// After `delay`, advance the match if its current turn is resolved.
    ///
    /// Resolves to `None` when nothing was advanced: the turn was not ready,
    /// the match had finished, or the advance failed. Must be called from
    /// within a tokio runtime.
    pub fn schedule_advance(&self, match_id: MatchId, delay: Duration) -> JoinHandle<Option<Advance>> {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match engine.advance_turn(match_id) {
                Ok(advance) => Some(advance),
                Err(EngineError::TurnNotResolved { turn, .. }) => {
                    tracing::info!(%match_id, %turn, "scheduled advance skipped; turn not resolved");
                    None
                }
                Err(EngineError::MatchFinished(_)) => {
                    tracing::debug!(%match_id, "scheduled advance skipped; match finished");
                    None
                }
                Err(err) => {
                    tracing::warn!(%match_id, error = %err, "scheduled advance failed");
                    None
                }
            }
        })
    }
}
