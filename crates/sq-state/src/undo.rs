//! Undo/Redo system using session snapshots
//!
//! `past` holds every committed snapshot, oldest first; its top is the current
//! state. The bottom entry (the initial state) is never undone away. Any new
//! push discards the redo path. History is unbounded unless a depth limit is
//! set, in which case the oldest entries are dropped.

use std::collections::VecDeque;

use sq_core::{SqError, SqResult};

use crate::Snapshot;

/// Something a snapshot can be restored into (session, audio graph, UI).
///
/// Restoring the same snapshot twice must leave the same observable state
/// as restoring it once.
pub trait RestoreTarget {
    fn restore(&mut self, snapshot: &Snapshot) -> SqResult<()>;
}

/// Lifecycle of the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing pushed yet
    Empty,
    /// At least one snapshot in `past`
    Active,
}

/// Snapshot undo/redo manager
#[derive(Debug)]
pub struct HistoryManager {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    max_depth: Option<usize>,
}

impl HistoryManager {
    /// Unbounded history
    pub fn new() -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: None,
        }
    }

    /// History keeping at most `max_depth` committed snapshots (at least one)
    pub fn with_max_depth(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            past: VecDeque::with_capacity(max_depth.min(1024)),
            future: Vec::new(),
            max_depth: Some(max_depth),
        }
    }

    /// Commit a snapshot as the new current state and drop the redo path
    pub fn push(&mut self, snapshot: Snapshot) {
        // Enforce max history
        if let Some(max_depth) = self.max_depth {
            while self.past.len() >= max_depth {
                self.past.pop_front();
            }
        }

        self.past.push_back(snapshot);
        self.future.clear();

        log::debug!("History push: {} past entries", self.past.len());
    }

    /// Step back; returns the snapshot that is now current
    pub fn undo(&mut self) -> SqResult<&Snapshot> {
        if self.past.len() <= 1 {
            return Err(SqError::NothingToUndo);
        }
        if let Some(current) = self.past.pop_back() {
            self.future.push(current);
        }
        log::debug!(
            "Undo: {} past / {} future entries",
            self.past.len(),
            self.future.len()
        );
        self.past.back().ok_or(SqError::NothingToUndo)
    }

    /// Step forward; returns the snapshot that is now current
    pub fn redo(&mut self) -> SqResult<&Snapshot> {
        let next = self.future.pop().ok_or(SqError::NothingToRedo)?;
        self.past.push_back(next);
        log::debug!(
            "Redo: {} past / {} future entries",
            self.past.len(),
            self.future.len()
        );
        self.past.back().ok_or(SqError::NothingToRedo)
    }

    /// Undo and restore the resulting snapshot into `target`.
    ///
    /// If the restore fails the step is taken back, so the current snapshot
    /// is unchanged.
    pub fn undo_into<T: RestoreTarget + ?Sized>(&mut self, target: &mut T) -> SqResult<()> {
        let snapshot = self.undo()?;
        match target.restore(snapshot) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(current) = self.future.pop() {
                    self.past.push_back(current);
                }
                log::warn!("Undo rolled back: {}", e);
                Err(e)
            }
        }
    }

    /// Redo and restore the resulting snapshot into `target`; rolled back on
    /// failure like [`HistoryManager::undo_into`]
    pub fn redo_into<T: RestoreTarget + ?Sized>(&mut self, target: &mut T) -> SqResult<()> {
        let snapshot = self.redo()?;
        match target.restore(snapshot) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(next) = self.past.pop_back() {
                    self.future.push(next);
                }
                log::warn!("Redo rolled back: {}", e);
                Err(e)
            }
        }
    }

    /// The current snapshot (top of `past`)
    pub fn current(&self) -> Option<&Snapshot> {
        self.past.back()
    }

    pub fn state(&self) -> HistoryState {
        if self.past.is_empty() {
            HistoryState::Empty
        } else {
            HistoryState::Active
        }
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.past.len().saturating_sub(1)
    }

    /// Number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    /// Depth limit, `None` when unbounded
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Get summary for UI display
    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            past_entries: self.past.len(),
            future_entries: self.future.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// History summary for UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySummary {
    pub past_entries: usize,
    pub future_entries: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}
