//! Worker threads, their handles and the messages exchanged with the coordinator

use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel::{Receiver, Sender, bounded};
use crossbeam::thread::Scope;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::plan::WorkItem;
use crate::config::{EnvironmentConfig, ScenarioRunConfig};
use crate::scenario::{BaseConfig, Diff, ScenarioResult, WorkKey};

/// Run-wide payload handed to every worker once, when it is spawned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerInit {
    pub scenario_config: ScenarioRunConfig,
    pub bases: Vec<BaseConfig>,
    pub environment: EnvironmentConfig,
}

impl WorkerInit {
    pub fn base(&self, name: &str) -> Option<&BaseConfig> {
        self.bases.iter().find(|base| base.name == name)
    }
}

/// Coordinator to worker: run this scenario against this base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub base: String,
    pub scenario: String,
}

impl Assignment {
    pub fn key(&self) -> WorkKey {
        WorkKey::new(&self.base, &self.scenario)
    }
}

impl From<&WorkItem> for Assignment {
    fn from(item: &WorkItem) -> Self {
        Self {
            base: item.base.name.clone(),
            scenario: item.scenario.name.clone(),
        }
    }
}

/// Worker to coordinator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScenarioResult>,
}

/// What a worker can tell the coordinator
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Message { worker: usize, message: WorkerMessage },
    /// The worker died without reporting a result for `assignment`
    Crashed {
        worker: usize,
        assignment: Assignment,
        reason: String,
    },
}

/// What a scenario body reports back; the worker fills in identity and timing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioOutcome {
    pub error: Option<String>,
    pub trace: Option<String>,
    pub diff: Option<Diff>,
}

impl ScenarioOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn with_diff(mut self, diff: Diff) -> Self {
        self.diff = Some(diff);
        self
    }

    fn into_result(self, key: &WorkKey, elapsed: Duration) -> ScenarioResult {
        ScenarioResult {
            error: self.error,
            trace: self.trace,
            diff: self.diff,
            ..ScenarioResult::passed(key, elapsed)
        }
    }
}

/// Runs scenario bodies inside one worker, one at a time
pub trait ScenarioExecutor {
    fn execute(&mut self, base: &BaseConfig, scenario: &str) -> ScenarioOutcome;
}

/// Builds one executor per worker from the spawn payload
pub trait ExecutorFactory: Send + Sync {
    type Executor: ScenarioExecutor;

    fn create(&self, init: &WorkerInit) -> Result<Self::Executor>;
}

/// Coordinator-side handle to one worker thread
///
/// Tracks the single item the worker may hold at any time.
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    assignments: Sender<Assignment>,
    in_flight: Option<WorkKey>,
}

impl WorkerHandle {
    pub fn new(id: usize, assignments: Sender<Assignment>) -> Self {
        Self {
            id,
            assignments,
            in_flight: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn in_flight(&self) -> Option<&WorkKey> {
        self.in_flight.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Send an item to the worker; refuses while another item is outstanding
    pub fn assign(&mut self, item: &WorkItem) -> Result<()> {
        if let Some(current) = &self.in_flight {
            bail!(
                "worker {} is still running {current}, refusing to assign {}",
                self.id,
                item.key()
            );
        }

        self.assignments
            .send(Assignment::from(item))
            .with_context(|| format!("worker {} is no longer accepting work", self.id))?;
        self.in_flight = Some(item.key());
        Ok(())
    }

    /// Acknowledge the result for the outstanding item
    pub fn complete(&mut self, key: &WorkKey) -> Result<()> {
        match &self.in_flight {
            Some(current) if current == key => {
                self.in_flight = None;
                Ok(())
            }
            Some(current) => bail!(
                "worker {} reported {key} but was assigned {current}",
                self.id
            ),
            None => bail!("worker {} reported {key} without an assignment", self.id),
        }
    }
}

/// Per-thread state, moved into the spawned worker
struct WorkerContext<'env, F> {
    worker_id: usize,
    init: WorkerInit,
    factory: &'env F,
    assignments: Receiver<Assignment>,
    events: Sender<WorkerEvent>,
}

/// Spawn a worker thread inside `scope` and return its handle
pub(crate) fn spawn_worker<'env, F: ExecutorFactory>(
    scope: &Scope<'env>,
    worker_id: usize,
    init: &WorkerInit,
    factory: &'env F,
    events: Sender<WorkerEvent>,
) -> Result<WorkerHandle> {
    let (assign_tx, assign_rx) = bounded(1);
    let ctx = WorkerContext {
        worker_id,
        init: init.clone(),
        factory,
        assignments: assign_rx,
        events,
    };

    scope
        .builder()
        .name(format!("scenario-worker-{worker_id}"))
        .spawn(move |_| worker_thread(ctx))
        .with_context(|| format!("Failed to spawn worker {worker_id}"))?;

    Ok(WorkerHandle::new(worker_id, assign_tx))
}

fn worker_thread<F: ExecutorFactory>(ctx: WorkerContext<'_, F>) {
    // A panicking factory must still report the item it was handed
    let mut executor = match panic::catch_unwind(AssertUnwindSafe(|| ctx.factory.create(&ctx.init))) {
        Ok(created) => created,
        Err(payload) => Err(anyhow!("executor panicked: {}", panic_message(payload.as_ref()))),
    };
    if let Err(e) = &executor {
        tracing::warn!("worker {} failed to initialize: {e:#}", ctx.worker_id);
    }

    while let Ok(assignment) = ctx.assignments.recv() {
        let executor = match executor.as_mut() {
            Ok(executor) => executor,
            Err(e) => {
                let reason = format!("executor failed to initialize: {e:#}");
                let _ = ctx.events.send(WorkerEvent::Crashed {
                    worker: ctx.worker_id,
                    assignment,
                    reason,
                });
                return;
            }
        };

        tracing::debug!("worker {} running {}", ctx.worker_id, assignment.key());
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            match ctx.init.base(&assignment.base) {
                Some(base) => executor.execute(base, &assignment.scenario),
                None => ScenarioOutcome::failure(format!("unknown base: {}", assignment.base)),
            }
        }));

        let event = match outcome {
            Ok(outcome) => WorkerEvent::Message {
                worker: ctx.worker_id,
                message: WorkerMessage {
                    result: Some(outcome.into_result(&assignment.key(), started.elapsed())),
                },
            },
            Err(payload) => {
                let _ = ctx.events.send(WorkerEvent::Crashed {
                    worker: ctx.worker_id,
                    assignment,
                    reason: panic_message(payload.as_ref()),
                });
                return;
            }
        };

        if ctx.events.send(event).is_err() {
            break; // Coordinator gone
        }
    }

    tracing::trace!("worker {} shutting down", ctx.worker_id);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "scenario panicked".to_string()
    }
}
