//! Collector-side implementor index.
//!
//! # Responsibility
//! - Merge every delivered contribution into one index.
//! - Deduplicate items per group key; the bridge never does.
//!
//! # Invariants
//! - Group order is first-seen order across all deliveries.
//! - Items keep first-seen order; exact duplicates for a key are skipped.
//! - An empty group still creates its key.

use crate::bridge::registry_bridge::Collector;
use crate::model::contribution::Contribution;
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct IndexedGroup {
    key: String,
    items: Vec<String>,
    seen: HashSet<String>,
}

/// Merged view of every contribution a collector received.
#[derive(Debug, Default)]
pub struct ImplementorIndex {
    groups: Vec<IndexedGroup>,
    deliveries: usize,
}

impl ImplementorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one contribution.
    ///
    /// Returns the number of items that were new to the index.
    pub fn merge(&mut self, contribution: Contribution) -> usize {
        self.deliveries += 1;
        let mut added = 0;
        for group in contribution.into_groups() {
            let position = match self.groups.iter().position(|g| g.key == group.key) {
                Some(position) => position,
                None => {
                    self.groups.push(IndexedGroup {
                        key: group.key,
                        ..IndexedGroup::default()
                    });
                    self.groups.len() - 1
                }
            };
            let target = &mut self.groups[position];
            for item in group.items {
                if target.seen.insert(item.clone()) {
                    target.items.push(item);
                    added += 1;
                }
            }
        }
        debug!(
            "event=index_merged module=index status=ok added={} groups={}",
            added,
            self.groups.len()
        );
        added
    }

    /// Number of contributions merged so far.
    pub fn deliveries(&self) -> usize {
        self.deliveries
    }

    pub fn group_keys(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.key.as_str()).collect()
    }

    pub fn items(&self, key: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.items.as_slice())
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    /// Snapshot of the merged index in contribution shape.
    pub fn to_contribution(&self) -> Contribution {
        self.groups
            .iter()
            .map(|group| (group.key.clone(), group.items.clone()))
            .collect()
    }
}

impl Collector for ImplementorIndex {
    fn collect(&mut self, contribution: Contribution) {
        self.merge(contribution);
    }
}

/// Cloneable, `Send` handle to an index that stays readable after the
/// collector side is registered with a bridge.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<Mutex<ImplementorIndex>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the index for reading or merging.
    pub fn lock(&self) -> MutexGuard<'_, ImplementorIndex> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Contribution {
        self.lock().to_contribution()
    }
}

impl Collector for SharedIndex {
    fn collect(&mut self, contribution: Contribution) {
        self.lock().merge(contribution);
    }
}
