use std::iter::Fuse;
use std::vec::IntoIter;

use super::plan::WorkItem;

/// Single-pass producer of runnable work items
///
/// Owned by the coordinating thread; `&mut self` keeps every take on that
/// thread. Once drained it keeps answering `None`.
#[derive(Debug)]
pub struct WorkSource {
    items: Fuse<IntoIter<WorkItem>>,
    taken: usize,
}

impl WorkSource {
    pub fn new(running: Vec<WorkItem>) -> Self {
        Self {
            items: running.into_iter().fuse(),
            taken: 0,
        }
    }

    /// Take the next item, or `None` when no work remains
    pub fn next_item(&mut self) -> Option<WorkItem> {
        let item = self.items.next()?;
        self.taken += 1;
        Some(item)
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::plan::expand;
    use crate::scenario::{BaseConfig, ScenarioDefinition};

    #[test]
    fn test_source_yields_each_item_once_then_none_forever() {
        let items = expand(
            &[BaseConfig::new("mainnet", "mainnet", "usdc")],
            &[ScenarioDefinition::new("A"), ScenarioDefinition::new("B")],
        );
        let mut source = WorkSource::new(items);

        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_item().unwrap().scenario.name, "A");
        assert_eq!(source.next_item().unwrap().scenario.name, "B");
        assert!(source.is_exhausted());

        for _ in 0..3 {
            assert!(source.next_item().is_none());
        }
        assert_eq!(source.taken(), 2);
    }

    #[test]
    fn test_empty_source_is_exhausted_immediately() {
        let mut source = WorkSource::new(Vec::new());
        assert!(source.is_exhausted());
        assert!(source.next_item().is_none());
    }
}
