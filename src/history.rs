// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Round History

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::EndReason;

/// Default number of rounds kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round_id: u64,
    pub final_multiplier: f64,
    pub timestamp_ms: f64,
    pub end_reason: EndReason,
}

/// Fixed-capacity ring of recent outcomes, newest first. Entries are never
/// modified after insertion.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(round_id: u64, m: f64) -> HistoryEntry {
        HistoryEntry {
            round_id,
            final_multiplier: m,
            timestamp_ms: round_id as f64 * 1000.0,
            end_reason: EndReason::Crashed,
        }
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut log = HistoryLog::default();
        for i in 1..=6u64 {
            log.record(entry(i, 1.0 + i as f64));
        }
        assert_eq!(log.len(), 5);
        let ids: Vec<u64> = log.entries().map(|e| e.round_id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2]);
        assert_eq!(log.latest().map(|e| e.final_multiplier), Some(7.0));
    }

    #[test]
    fn test_custom_capacity() {
        let mut log = HistoryLog::with_capacity(2);
        log.record(entry(1, 1.5));
        log.record(entry(2, 2.5));
        log.record(entry(3, 3.5));
        assert_eq!(log.to_vec(), vec![entry(3, 3.5), entry(2, 2.5)]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut log = HistoryLog::with_capacity(0);
        assert_eq!(log.capacity(), 1);
        log.record(entry(1, 1.5));
        log.record(entry(2, 2.5));
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().round_id, 2);
        log.clear();
        assert!(log.is_empty());
    }
}
