// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-interval log line counts.

use crate::metric::{Key, Sample};
use fnv::FnvBuildHasher;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

pub(crate) type KeyMap<V> = HashMap<Key, V, FnvBuildHasher>;

/// Counts of the current, not yet published interval.
///
/// Owned by the aggregator service task, so it carries no locking of its own.
#[derive(Debug, Default)]
pub struct Aggregator {
    counts: KeyMap<u64>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sample: Sample) {
        match self.counts.entry(sample.key) {
            Entry::Occupied(mut entry) => *entry.get_mut() += 1,
            Entry::Vacant(entry) => {
                entry.insert(1);
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<u64> {
        self.counts.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Hands out the counts of the interval and starts a new, empty one.
    pub fn consume(&mut self) -> Snapshot {
        Snapshot {
            counts: std::mem::take(&mut self.counts),
        }
    }
}

/// Frozen counts of one interval.
#[derive(Debug, Default)]
pub struct Snapshot {
    counts: KeyMap<u64>,
}

impl Snapshot {
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &u64)> {
        self.counts.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.counts.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
