// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per log stream history of published interval counts.

use crate::aggregator::{KeyMap, Snapshot};
use crate::constants::HISTORY_CAPACITY;
use crate::metric::Key;
use std::collections::VecDeque;

/// Interval counts of one stream, newest first, capped at a fixed capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History {
    counts: VecDeque<u64>,
    capacity: usize,
}

impl History {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        History {
            counts: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Records the newest interval, evicting the oldest one when full.
    pub fn push(&mut self, count: u64) {
        self.counts.push_front(count);
        self.counts.truncate(self.capacity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u64> + ExactSizeIterator + '_ {
        self.counts.iter().copied()
    }

    /// Builds a history from counts listed newest first. Counts beyond the
    /// default capacity are dropped.
    #[must_use]
    pub fn from_newest_first(counts: &[u64]) -> Self {
        let mut history = History::with_capacity(HISTORY_CAPACITY);
        for count in counts.iter().rev() {
            history.push(*count);
        }
        history
    }
}

/// Histories of every stream seen since startup.
///
/// A stream is never forgotten: once it has been published, every later
/// interval adds a zero for it when it logged nothing.
#[derive(Debug)]
pub struct HistoryTracker {
    histories: KeyMap<History>,
    capacity: usize,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryTracker {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        HistoryTracker {
            histories: KeyMap::default(),
            capacity,
        }
    }

    /// Adds exactly one entry to every known stream and to every stream of
    /// the snapshot: its count for the interval, or zero when it was silent.
    pub fn record_interval(&mut self, snapshot: &Snapshot) {
        for key in snapshot.keys() {
            if !self.histories.contains_key(key) {
                self.histories.insert(*key, History::with_capacity(self.capacity));
            }
        }

        for (key, history) in self.histories.iter_mut() {
            history.push(snapshot.get(key).unwrap_or(0));
        }
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&History> {
        self.histories.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &History)> {
        self.histories.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::metric::Sample;
    use proptest::prelude::*;

    fn snapshot_of(samples: &[(&str, &str)]) -> Snapshot {
        let mut aggregator = Aggregator::new();
        for (collector, container) in samples {
            aggregator.insert(Sample::new(collector, container));
        }
        aggregator.consume()
    }

    #[test]
    fn test_push_is_newest_first_and_evicts_oldest() {
        let mut history = History::with_capacity(3);
        for count in 1..=5 {
            history.push(count);
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![5, 4, 3]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_from_newest_first() {
        let history = History::from_newest_first(&[0, 0, 7, 8]);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![0, 0, 7, 8]);
    }

    #[test]
    fn test_new_stream_gets_history() {
        let mut tracker = HistoryTracker::default();
        tracker.record_interval(&snapshot_of(&[("p", "a"), ("p", "a")]));

        let history = tracker.get(&Key::new("p", "a")).unwrap();
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_silent_stream_records_zero() {
        let mut tracker = HistoryTracker::default();
        tracker.record_interval(&snapshot_of(&[("p", "a"), ("p", "b")]));
        tracker.record_interval(&snapshot_of(&[("p", "b")]));
        tracker.record_interval(&Snapshot::default());

        let a = tracker.get(&Key::new("p", "a")).unwrap();
        let b = tracker.get(&Key::new("p", "b")).unwrap();
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0, 0, 1]);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![0, 1, 1]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_streams_joining_late_have_shorter_history() {
        let mut tracker = HistoryTracker::default();
        tracker.record_interval(&snapshot_of(&[("p", "a")]));
        tracker.record_interval(&snapshot_of(&[("p", "a"), ("p", "late")]));

        assert_eq!(tracker.get(&Key::new("p", "a")).unwrap().len(), 2);
        assert_eq!(tracker.get(&Key::new("p", "late")).unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn history_never_exceeds_capacity(intervals in proptest::collection::vec(0usize..4, 0..60)) {
            let mut tracker = HistoryTracker::default();
            for (i, samples) in intervals.iter().enumerate() {
                let mut aggregator = Aggregator::new();
                for _ in 0..*samples {
                    aggregator.insert(Sample::new("p", "a"));
                }
                tracker.record_interval(&aggregator.consume());

                if let Some(history) = tracker.get(&Key::new("p", "a")) {
                    prop_assert!(history.len() <= HISTORY_CAPACITY);
                    prop_assert_eq!(history.iter().next(), Some(*samples as u64));
                    prop_assert!(history.len() <= i + 1);
                }
            }
        }
    }
}
