//! Single-step undo history built from whole-session snapshots.
//!
//! Every mutating operation pushes a snapshot of the session first,
//! so popping one entry and restoring it exactly reverses the most
//! recent mutation. There is no redo.

use std::collections::VecDeque;

use crate::constants::history;
use crate::model::{CropRect, Point, Polygon};

/// The undoable portion of a session, deep-copied.
///
/// The image buffer and view transform are deliberately not captured;
/// undo never un-loads an image or moves the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub polygons: Vec<Polygon>,
    pub draft: Vec<Point>,
    pub crop: Option<CropRect>,
    pub next_id: u32,
    pub next_color_index: usize,
    pub selected: Option<usize>,
}

/// Bounded last-in-first-out stack of session snapshots.
///
/// Pushing beyond capacity evicts the oldest entry, so the stack holds
/// the most recent mutations and pushing never fails.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history with the standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(history::CAPACITY)
    }

    /// Create a history with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a snapshot, evicting the oldest entry when full.
    pub fn push(&mut self, snapshot: Snapshot) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
        log::debug!("History: pushed snapshot ({} retained)", self.entries.len());
    }

    /// Pop the most recent snapshot, or `None` when empty.
    pub fn pop(&mut self) -> Option<Snapshot> {
        let snapshot = self.entries.pop_back();
        if snapshot.is_some() {
            log::debug!("History: popped snapshot ({} retained)", self.entries.len());
        }
        snapshot
    }

    /// Whether undo is available.
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        log::debug!("History cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_id(next_id: u32) -> Snapshot {
        Snapshot {
            polygons: Vec::new(),
            draft: Vec::new(),
            crop: None,
            next_id,
            next_color_index: 0,
            selected: None,
        }
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut history = History::new();
        assert!(!history.can_undo());

        history.push(snapshot_with_id(1));
        history.push(snapshot_with_id(2));

        assert_eq!(history.pop().unwrap().next_id, 2);
        assert_eq!(history.pop().unwrap().next_id, 1);
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::with_capacity(3);
        for i in 1..=5 {
            history.push(snapshot_with_id(i));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.pop().unwrap().next_id, 5);
        assert_eq!(history.pop().unwrap().next_id, 4);
        assert_eq!(history.pop().unwrap().next_id, 3);
        // 1 and 2 were evicted
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(snapshot_with_id(1));
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }
}
