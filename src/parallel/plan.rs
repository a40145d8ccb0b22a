use std::sync::Arc;

use crate::scenario::{BaseConfig, ScenarioDefinition, ScenarioFlag, ScenarioResult, WorkKey};

/// One base x scenario pairing, created once and never mutated
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub base: Arc<BaseConfig>,
    pub scenario: Arc<ScenarioDefinition>,
}

impl WorkItem {
    pub fn key(&self) -> WorkKey {
        WorkKey::new(&self.base.name, &self.scenario.name)
    }

    pub fn flag(&self) -> ScenarioFlag {
        self.scenario.flag
    }
}

/// Expand bases and scenarios into every pairing, scenarios iterated within each base
pub fn expand(bases: &[BaseConfig], scenarios: &[ScenarioDefinition]) -> Vec<WorkItem> {
    let scenarios: Vec<Arc<ScenarioDefinition>> = scenarios.iter().cloned().map(Arc::new).collect();

    bases
        .iter()
        .cloned()
        .map(Arc::new)
        .flat_map(|base| {
            scenarios.iter().map(move |scenario| WorkItem {
                base: Arc::clone(&base),
                scenario: Arc::clone(scenario),
            })
        })
        .collect()
}

/// Work items split into what executes and what is recorded as skipped
#[derive(Debug, Default, Clone)]
pub struct RunPlan {
    pub running: Vec<WorkItem>,
    pub skipped: Vec<WorkItem>,
}

impl RunPlan {
    /// Expand and filter in one step
    pub fn build(bases: &[BaseConfig], scenarios: &[ScenarioDefinition]) -> Self {
        filter_running(expand(bases, scenarios))
    }

    pub fn total(&self) -> usize {
        self.running.len() + self.skipped.len()
    }

    pub fn running_keys(&self) -> impl Iterator<Item = WorkKey> + '_ {
        self.running.iter().map(WorkItem::key)
    }

    /// Results recorded up front for every skipped item
    pub fn skipped_results(&self) -> Vec<ScenarioResult> {
        self.skipped
            .iter()
            .map(|item| ScenarioResult::skipped(&item.key()))
            .collect()
    }
}

/// Partition items by scenario flag
///
/// A single `only` anywhere restricts the run to `only` items across every
/// base. Skipped output keeps `skip`-flagged items ahead of the unflagged ones
/// that an `only` pushed out.
pub fn filter_running(items: Vec<WorkItem>) -> RunPlan {
    let mut rest = Vec::new();
    let mut only = Vec::new();
    let mut skip = Vec::new();

    for item in items {
        match item.flag() {
            ScenarioFlag::None => rest.push(item),
            ScenarioFlag::Only => only.push(item),
            ScenarioFlag::Skip => skip.push(item),
        }
    }

    if only.is_empty() {
        RunPlan {
            running: rest,
            skipped: skip,
        }
    } else {
        skip.extend(rest);
        RunPlan {
            running: only,
            skipped: skip,
        }
    }
}
