use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use super::plan::RunPlan;
use crate::scenario::{ScenarioResult, WorkKey};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initialized,
    Dispatching,
    Completed,
}

/// Final collection of results, delivered once when the pending set drains
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<ScenarioResult>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|result| result.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|result| result.skipped).count()
    }

    /// A run fails iff at least one result carries an error
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(ScenarioResult::is_failure)
    }
}

/// Receiving side of the completion signal
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<RunSummary>,
}

impl Completion {
    pub async fn wait(self) -> Result<RunSummary> {
        self.rx
            .await
            .context("Run stopped before every scenario reported a result")
    }

    /// Blocking variant for callers outside an async context
    pub fn blocking_wait(self) -> Result<RunSummary> {
        self.rx
            .blocking_recv()
            .context("Run stopped before every scenario reported a result")
    }
}

/// Pending-set bookkeeping and result collection for one run
///
/// Owned by the coordinator; nothing else mutates it.
#[derive(Debug)]
pub struct ResultAggregator {
    pending: HashSet<WorkKey>,
    results: Vec<ScenarioResult>,
    phase: RunPhase,
    started: Instant,
    done: Option<oneshot::Sender<RunSummary>>,
}

impl ResultAggregator {
    /// Seed the pending set with the running items; skipped items are recorded immediately
    pub fn new(plan: &RunPlan) -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        let aggregator = Self {
            pending: plan.running_keys().collect(),
            results: plan.skipped_results(),
            phase: RunPhase::Initialized,
            started: Instant::now(),
            done: Some(tx),
        };
        (aggregator, Completion { rx })
    }

    /// Leave `Initialized`; a run with nothing pending completes right here
    pub fn start(&mut self) {
        if self.phase == RunPhase::Initialized {
            self.phase = RunPhase::Dispatching;
            self.check_done();
        }
    }

    /// Merge one result and remove its key from the pending set
    pub fn record(&mut self, result: ScenarioResult) -> Result<RunPhase> {
        let key = result.key();
        if !self.pending.remove(&key) {
            bail!("Received a result for {key}, which is not pending");
        }

        if result.is_failure() {
            tracing::debug!("{key} failed: {}", result.error.as_deref().unwrap_or_default());
        }
        self.results.push(result);
        self.check_done();
        Ok(self.phase)
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &WorkKey) -> bool {
        self.pending.contains(key)
    }

    fn check_done(&mut self) {
        if !self.pending.is_empty() {
            return;
        }
        self.phase = RunPhase::Completed;

        // Taking the sender makes the signal fire exactly once
        if let Some(done) = self.done.take() {
            let summary = RunSummary {
                results: std::mem::take(&mut self.results),
                elapsed: self.started.elapsed(),
            };
            tracing::info!(
                "run complete: {} results in {:.2}s",
                summary.results.len(),
                summary.elapsed.as_secs_f64()
            );
            if done.send(summary).is_err() {
                tracing::debug!("completion receiver dropped before the run finished");
            }
        }
    }
}
