//! Unattended play.
//!
//! ## Simulation
//!
//! `Simulation` is the synchronous core: each `step` re-reads the match,
//! submits decisions for bot-controlled roles, resolves, and advances. It
//! never trusts an earlier read; every decision is based on the snapshot
//! taken at the top of the step, and races with other writers surface as
//! rejections that the next step absorbs by reading again.
//!
//! A step stops the run when:
//! - the match finished;
//! - `max_turns` turns were resolved since the run started;
//! - the hard iteration cap was hit (`SimulationTimeout`);
//! - more than `conflict_retries` consecutive steps were rejected, or an
//!   unexpected error occurred (`Failed`).
//!
//! ## Orchestrator
//!
//! `Orchestrator::run_auto_simulation` drives a `Simulation` on a tokio
//! task. Cancellation is a watch flag checked at the top of each iteration,
//! so a resolution in progress always completes. At most one run per match
//! is active at a time.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{Advance, Caller, DuelEngine};
use crate::bots::BotView;
use crate::core::{Choice, Control, GameRng, MatchId, MatchOutcome, Role, SeatMap, TurnId};
use crate::error::{EngineError, EngineResult};
use crate::events::MatchEvent;
use crate::rules::{ResolveOutcome, TurnResolution};
use crate::store::MatchStore;

/// Why a run stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxTurnsReached,
    MatchFinished,
    Cancelled,
    /// The hard iteration cap was reached first.
    SimulationTimeout,
    Failed(String),
}

/// Something a step did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStep {
    /// A bot locked a decision.
    Decided { turn: TurnId, role: Role, choice: Choice },
    Resolved(TurnResolution),
    Advanced(Advance),
    /// A rejection was absorbed; the next step re-reads.
    Retried { reason: String },
}

/// Result of one `Simulation::step`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Progress was made (possibly none, after an absorbed conflict).
    Progress(SmallVec<[SimulationStep; 4]>),
    /// Only human decisions are pending.
    Waiting(SmallVec<[Role; 2]>),
    Stop(StopReason),
}

/// Final report of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub match_id: MatchId,
    pub reason: StopReason,
    pub iterations: u32,
    /// Turns resolved while the run was active, by anyone.
    pub turns_resolved: u32,
    pub scores: SeatMap<u32>,
    pub outcome: Option<MatchOutcome>,
}

/// Synchronous simulation core for one match.
pub struct Simulation<S> {
    engine: DuelEngine<S>,
    match_id: MatchId,
    max_turns: u32,
    rng: GameRng,
    baseline: u32,
    resolved_in_run: u32,
    iterations: u32,
    conflicts: u32,
    scores: SeatMap<u32>,
    outcome: Option<MatchOutcome>,
}

impl<S: MatchStore> Simulation<S> {
    /// Prepare a run of at most `max_turns` resolved turns.
    pub fn new(engine: DuelEngine<S>, match_id: MatchId, max_turns: u32) -> EngineResult<Self> {
        let record = engine.snapshot(match_id)?;
        let rng = GameRng::for_match(engine.config().seed, match_id).for_context("bots");
        Ok(Self {
            engine,
            match_id,
            max_turns,
            rng,
            baseline: record.turns_resolved,
            resolved_in_run: 0,
            iterations: 0,
            conflicts: 0,
            scores: record.scores.totals(),
            outcome: record.outcome(),
        })
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Turns resolved since the run started.
    pub fn resolved_in_run(&self) -> u32 {
        self.resolved_in_run
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// One iteration of the loop.
    pub fn step(&mut self) -> Tick {
        if self.iterations >= self.engine.config().simulation.hard_iteration_cap {
            return Tick::Stop(StopReason::SimulationTimeout);
        }
        self.iterations += 1;

        let record = match self.engine.snapshot(self.match_id) {
            Ok(record) => record,
            Err(err) => return Tick::Stop(StopReason::Failed(err.to_string())),
        };
        self.resolved_in_run = record.turns_resolved.saturating_sub(self.baseline);
        self.scores = record.scores.totals();
        self.outcome = record.outcome();

        if record.is_finished() {
            return Tick::Stop(StopReason::MatchFinished);
        }
        if self.resolved_in_run >= self.max_turns {
            return Tick::Stop(StopReason::MaxTurnsReached);
        }

        let mut steps = SmallVec::new();
        let turn = record.current.id;

        if record.current.resolved {
            return match self.engine.advance_turn(self.match_id) {
                Ok(advance) => {
                    self.conflicts = 0;
                    steps.push(SimulationStep::Advanced(advance));
                    Tick::Progress(steps)
                }
                Err(err) => self.absorb(err, steps),
            };
        }

        let view = BotView {
            dealer_value: record.current.dealer_value,
            active_hand: record.cards.hand(record.active_seat),
        };
        let mut humans: SmallVec<[Role; 2]> = SmallVec::new();
        let mut resolved_by_submit = false;

        for role in record.current.pending_roles() {
            let (active, guess) = match record.participant_for(role).control {
                Control::Human => {
                    humans.push(role);
                    continue;
                }
                Control::Bot { active, guess } => (active, guess),
            };

            let choice = match self.engine.strategist().decide(role, active, guess, &view, &mut self.rng) {
                Some(choice) => choice,
                None => {
                    return Tick::Stop(StopReason::Failed(format!(
                        "{} has no value to play in {turn}",
                        record.active_seat
                    )))
                }
            };

            match self.engine.submit_as(Caller::System, self.match_id, turn, role, choice) {
                Ok(submission) => {
                    tracing::debug!(match_id = %self.match_id, %turn, %role, %choice, "bot decided");
                    steps.push(SimulationStep::Decided { turn, role, choice });
                    if let Some(resolution) = submission.auto_resolved {
                        resolved_by_submit = true;
                        steps.push(SimulationStep::Resolved(resolution));
                    }
                }
                Err(err) => return self.absorb(err, steps),
            }
        }

        if !humans.is_empty() {
            if steps.is_empty() {
                return Tick::Waiting(humans);
            }
            self.conflicts = 0;
            return Tick::Progress(steps);
        }

        if !resolved_by_submit {
            match self.engine.resolve_turn(self.match_id, turn) {
                Ok(ResolveOutcome::Resolved(resolution)) => {
                    steps.push(SimulationStep::Resolved(resolution));
                }
                Ok(ResolveOutcome::AlreadyResolved(_)) => {}
                Err(err) => return self.absorb(err, steps),
            }
        }

        self.conflicts = 0;
        Tick::Progress(steps)
    }

    /// Turn a rejection into a retry, or stop the run.
    fn absorb(&mut self, err: EngineError, mut steps: SmallVec<[SimulationStep; 4]>) -> Tick {
        let absorbable = err.is_retryable()
            || matches!(
                err,
                EngineError::AlreadyLocked { .. }
                    | EngineError::TurnClosed { .. }
                    | EngineError::TurnNotResolved { .. }
                    | EngineError::TurnNotReady { .. }
            );

        if matches!(err, EngineError::MatchFinished(_)) {
            return Tick::Stop(StopReason::MatchFinished);
        }
        if !absorbable {
            tracing::warn!(match_id = %self.match_id, error = %err, "simulation failed");
            return Tick::Stop(StopReason::Failed(err.to_string()));
        }

        self.conflicts += 1;
        let limit = self.engine.config().simulation.conflict_retries;
        if self.conflicts > limit {
            tracing::warn!(match_id = %self.match_id, conflicts = self.conflicts, "too many conflicts");
            return Tick::Stop(StopReason::Failed(format!(
                "{} consecutive conflicts, last: {err}",
                self.conflicts
            )));
        }

        tracing::debug!(match_id = %self.match_id, error = %err, "absorbed conflict; re-reading");
        steps.push(SimulationStep::Retried { reason: err.to_string() });
        Tick::Progress(steps)
    }

    /// Summary as of the last step.
    pub fn summary(&self, reason: StopReason) -> SimulationSummary {
        SimulationSummary {
            match_id: self.match_id,
            reason,
            iterations: self.iterations,
            turns_resolved: self.resolved_in_run,
            scores: self.scores,
            outcome: self.outcome,
        }
    }

    /// Refresh the totals from the store before summarizing. A snapshot
    /// older than what the run already observed is ignored.
    fn refresh(&mut self) {
        if let Ok(record) = self.engine.snapshot(self.match_id) {
            let resolved = record.turns_resolved.saturating_sub(self.baseline);
            if resolved < self.resolved_in_run {
                return;
            }
            self.resolved_in_run = resolved;
            self.scores = record.scores.totals();
            self.outcome = record.outcome();
        }
    }
}

// =============================================================================
// Async driver
// =============================================================================

/// Returned by `cancel_auto_simulation`, whether or not a run was active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged;

type Registry = Arc<Mutex<FxHashMap<MatchId, Arc<watch::Sender<bool>>>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, FxHashMap<MatchId, Arc<watch::Sender<bool>>>> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("simulation registry lock poisoned; recovering");
            poisoned.into_inner()
        }
    }
}

/// Stream of steps from a running simulation.
///
/// Delivery is best effort: if the buffer is full the step is dropped. The
/// summary from `join` is authoritative.
#[derive(Debug)]
pub struct SimulationSteps {
    receiver: mpsc::Receiver<SimulationStep>,
}

impl Stream for SimulationSteps {
    type Item = SimulationStep;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Handle to a running simulation.
#[derive(Debug)]
pub struct SimulationHandle {
    match_id: MatchId,
    steps: Option<SimulationSteps>,
    cancel: Arc<watch::Sender<bool>>,
    task: JoinHandle<SimulationSummary>,
}

impl SimulationHandle {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Take the step stream. Returns `None` after the first call.
    pub fn steps(&mut self) -> Option<SimulationSteps> {
        self.steps.take()
    }

    /// Ask the run to stop at its next iteration.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait for the run to stop.
    pub async fn join(self) -> EngineResult<SimulationSummary> {
        self.task
            .await
            .map_err(|e| EngineError::Internal(format!("simulation task failed: {e}")))
    }
}

/// Runs simulations on the tokio runtime.
pub struct Orchestrator<S> {
    engine: DuelEngine<S>,
    running: Registry,
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            running: Arc::clone(&self.running),
        }
    }
}

impl<S: MatchStore> Orchestrator<S> {
    pub fn new(engine: DuelEngine<S>) -> Self {
        Self {
            engine,
            running: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    pub fn engine(&self) -> &DuelEngine<S> {
        &self.engine
    }

    /// Whether a run is active for `match_id`.
    pub fn is_running(&self, match_id: MatchId) -> bool {
        lock(&self.running).contains_key(&match_id)
    }

    /// Spawn a run of at most `max_turns` resolved turns.
    ///
    /// Fails with `SimulationRunning` if one is already active for this
    /// match. Must be called from within a tokio runtime.
    pub fn run_auto_simulation(&self, match_id: MatchId, max_turns: u32) -> EngineResult<SimulationHandle> {
        let sim = Simulation::new(self.engine.clone(), match_id, max_turns)?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel = Arc::new(cancel_tx);
        {
            let mut running = lock(&self.running);
            if running.contains_key(&match_id) {
                return Err(EngineError::SimulationRunning(match_id));
            }
            running.insert(match_id, Arc::clone(&cancel));
        }

        let buffer = self.engine.config().simulation.step_buffer;
        let (tx, rx) = mpsc::channel(buffer);
        let engine = self.engine.clone();
        let running = Arc::clone(&self.running);

        tracing::info!(%match_id, max_turns, "simulation started");
        let task = tokio::spawn(async move {
            let summary = drive(sim, cancel_rx, tx).await;
            lock(&running).remove(&match_id);
            tracing::info!(
                %match_id,
                reason = ?summary.reason,
                turns = summary.turns_resolved,
                iterations = summary.iterations,
                "simulation stopped"
            );
            engine.publish(MatchEvent::SimulationStopped {
                match_id,
                summary: summary.clone(),
            });
            summary
        });

        Ok(SimulationHandle {
            match_id,
            steps: Some(SimulationSteps { receiver: rx }),
            cancel,
            task,
        })
    }

    /// Signal the run for `match_id` to stop. Always acknowledges.
    pub fn cancel_auto_simulation(&self, match_id: MatchId) -> Acknowledged {
        match lock(&self.running).get(&match_id) {
            Some(cancel) => {
                cancel.send_replace(true);
                tracing::info!(%match_id, "simulation cancellation requested");
            }
            None => tracing::debug!(%match_id, "no simulation to cancel"),
        }
        Acknowledged
    }
}

async fn drive<S: MatchStore>(
    mut sim: Simulation<S>,
    mut cancel: watch::Receiver<bool>,
    tx: mpsc::Sender<SimulationStep>,
) -> SimulationSummary {
    let poll = sim.engine.config().simulation.poll_interval();

    let reason = loop {
        if *cancel.borrow() {
            break StopReason::Cancelled;
        }

        match sim.step() {
            Tick::Progress(steps) => {
                for step in steps {
                    if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(step) {
                        tracing::debug!(match_id = %sim.match_id, "step stream full; dropping step");
                    }
                }
                tokio::task::yield_now().await;
            }
            Tick::Waiting(_) => {
                tokio::select! {
                    _ = tokio::time::sleep(poll) => {}
                    _ = cancel.changed() => {}
                }
            }
            Tick::Stop(reason) => break reason,
        }
    };

    sim.refresh();
    sim.summary(reason)
}
