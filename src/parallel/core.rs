use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel::unbounded;
use serde::{Deserialize, Serialize};

use super::plan::RunPlan;
use super::source::WorkSource;
use super::tracker::{ResultAggregator, RunSummary};
use super::worker::{ExecutorFactory, WorkerEvent, WorkerHandle, WorkerInit, spawn_worker};
use crate::scenario::{ScenarioResult, WorkKey};

/// What the coordinator does when a worker dies without reporting a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrashPolicy {
    /// Record an error result for the lost item and replace the worker
    #[default]
    Error,
    /// Stop dispatching and fail the whole run
    Abort,
}

/// Assignment counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Assignments made right after a worker was created
    pub initial: usize,
    /// Assignments triggered by a result or a replacement worker
    pub reassigned: usize,
    /// Workers that died mid-item
    pub crashed: usize,
}

impl DispatchStats {
    pub fn total(&self) -> usize {
        self.initial + self.reassigned
    }
}

/// Hands work items to idle workers, one outstanding item per worker
///
/// Sole owner of the worker handles and the work source for the run.
#[derive(Debug)]
pub struct Dispatcher {
    source: WorkSource,
    workers: Vec<Option<WorkerHandle>>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(source: WorkSource) -> Self {
        Self {
            source,
            workers: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Id the next added worker must carry
    pub fn next_worker_id(&self) -> usize {
        self.workers.len()
    }

    /// Register a freshly created worker and offer it the next item
    pub fn add_worker(&mut self, handle: WorkerHandle) -> Result<Option<WorkKey>> {
        let id = handle.id();
        if id != self.next_worker_id() {
            bail!("worker id {id} out of sequence, expected {}", self.next_worker_id());
        }
        self.workers.push(Some(handle));
        self.assign(id, true)
    }

    /// Offer the next item to a worker that just reported
    pub fn assign_next(&mut self, worker: usize) -> Result<Option<WorkKey>> {
        self.assign(worker, false)
    }

    /// Clear the worker's outstanding item once its result arrived
    pub fn complete(&mut self, worker: usize, key: &WorkKey) -> Result<()> {
        self.handle_mut(worker)?.complete(key)
    }

    /// Drop a crashed worker's handle; it never receives work again
    pub fn retire(&mut self, worker: usize) -> Result<()> {
        let slot = self
            .workers
            .get_mut(worker)
            .ok_or_else(|| anyhow!("unknown worker {worker}"))?;
        if slot.take().is_none() {
            bail!("worker {worker} was already retired");
        }
        self.stats.crashed += 1;
        Ok(())
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn has_remaining_work(&self) -> bool {
        !self.source.is_exhausted()
    }

    /// Keys currently held by live workers
    pub fn in_flight(&self) -> impl Iterator<Item = &WorkKey> {
        self.workers
            .iter()
            .flatten()
            .filter_map(WorkerHandle::in_flight)
    }

    fn assign(&mut self, worker: usize, initial: bool) -> Result<Option<WorkKey>> {
        // Fail before taking from the source so no item is lost
        let handle = self.handle_mut(worker)?;
        if !handle.is_idle() {
            bail!("worker {worker} already holds an item");
        }

        let Some(item) = self.source.next_item() else {
            tracing::trace!("no work left for worker {worker}, leaving it idle");
            return Ok(None);
        };

        let key = item.key();
        self.handle_mut(worker)?.assign(&item)?;
        if initial {
            self.stats.initial += 1;
        } else {
            self.stats.reassigned += 1;
        }
        tracing::debug!("assigned {key} to worker {worker}");
        Ok(Some(key))
    }

    fn handle_mut(&mut self, worker: usize) -> Result<&mut WorkerHandle> {
        self.workers
            .get_mut(worker)
            .and_then(Option::as_mut)
            .ok_or_else(|| anyhow!("worker {worker} is not alive"))
    }
}

/// Drives one run: spawns the pool, dispatches, aggregates
pub struct ScenarioRunner<F> {
    factory: F,
    workers: usize,
    crash_policy: CrashPolicy,
}

impl<F: ExecutorFactory> ScenarioRunner<F> {
    pub fn new(factory: F, workers: usize) -> Self {
        Self {
            factory,
            workers: workers.max(1),
            crash_policy: CrashPolicy::default(),
        }
    }

    pub fn with_crash_policy(mut self, crash_policy: CrashPolicy) -> Self {
        self.crash_policy = crash_policy;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run the coordinator until the aggregator signals completion
    ///
    /// Blocks the calling thread. The results travel through the aggregator's
    /// completion signal, not the return value.
    pub fn run(
        &self,
        plan: RunPlan,
        init: WorkerInit,
        mut aggregator: ResultAggregator,
    ) -> Result<DispatchStats> {
        aggregator.start();
        if aggregator.is_complete() {
            tracing::info!("nothing to run ({} skipped)", plan.skipped.len());
            return Ok(DispatchStats::default());
        }

        // Extra workers would only ever sit idle
        let worker_count = std::cmp::min(self.workers, plan.running.len());
        tracing::info!(
            "dispatching {} scenarios to {} workers",
            plan.running.len(),
            worker_count
        );

        let source = WorkSource::new(plan.running);
        let (event_tx, event_rx) = unbounded();

        crossbeam::thread::scope(|scope| -> Result<DispatchStats> {
            let mut dispatcher = Dispatcher::new(source);
            for _ in 0..worker_count {
                let id = dispatcher.next_worker_id();
                let handle = spawn_worker(scope, id, &init, &self.factory, event_tx.clone())?;
                dispatcher.add_worker(handle)?;
            }

            while !aggregator.is_complete() {
                let event = event_rx
                    .recv()
                    .context("Worker channel closed with scenarios still pending")?;

                match event {
                    WorkerEvent::Message { worker, message } => {
                        let Some(result) = message.result else {
                            tracing::trace!("ignoring message without a result from worker {worker}");
                            continue;
                        };
                        dispatcher.complete(worker, &result.key())?;
                        aggregator.record(result)?;
                        dispatcher.assign_next(worker)?;
                    }
                    WorkerEvent::Crashed {
                        worker,
                        assignment,
                        reason,
                    } => {
                        let key = assignment.key();
                        tracing::warn!("worker {worker} crashed while running {key}: {reason}");
                        dispatcher.complete(worker, &key)?;
                        dispatcher.retire(worker)?;

                        match self.crash_policy {
                            CrashPolicy::Abort => {
                                bail!("Worker {worker} crashed while running {key}: {reason}")
                            }
                            CrashPolicy::Error => {
                                let error = format!("worker {worker} crashed: {reason}");
                                aggregator.record(ScenarioResult::failed(&key, error))?;

                                if dispatcher.has_remaining_work() {
                                    let id = dispatcher.next_worker_id();
                                    let handle =
                                        spawn_worker(scope, id, &init, &self.factory, event_tx.clone())?;
                                    tracing::debug!("worker {id} replaces crashed worker {worker}");
                                    dispatcher.add_worker(handle)?;
                                }
                            }
                        }
                    }
                }
            }

            let stats = dispatcher.stats();
            // Closing every assignment channel lets idle workers exit before the scope joins them
            drop(dispatcher);
            Ok(stats)
        })
        .map_err(|_| anyhow!("Thread panic occurred during scenario dispatch"))?
    }

    /// Run and wait for the summary on the current thread
    pub fn run_to_completion(&self, plan: RunPlan, init: WorkerInit) -> Result<(RunSummary, DispatchStats)> {
        let (aggregator, completion) = ResultAggregator::new(&plan);
        let stats = self.run(plan, init, aggregator)?;
        Ok((completion.blocking_wait()?, stats))
    }
}

/// Worker count for a run: an explicit setting wins, otherwise a share of the CPU cores
pub fn calculate_optimal_workers(configured: usize, thread_percentage: u8) -> usize {
    if configured > 0 {
        return configured;
    }

    let available_cores = num_cpus::get();
    std::cmp::max(1, (available_cores * thread_percentage as usize) / 100)
}
