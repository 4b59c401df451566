//! Bounded, branch-truncating undo history of per-layer tile grid snapshots.

use tracing::debug;

use crate::tile_grid::TileGrid;

const DEFAULT_MAX_STATES: usize = 50;

/// A single point in the undo history: a description, a monotonic
/// timestamp, and a deep-copied snapshot of every layer's pixels at push
/// time. Carries no layer metadata (name, opacity, blend mode) — undo
/// restores pixel state only.
#[derive(Clone)]
pub struct UndoState {
    pub description: String,
    pub timestamp_secs: u64,
    pub snapshots: Vec<TileGrid>,
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Bounded history with a max-states ceiling and a current index.
///
/// Invariant: `0 <= current_index <= states.len()`. `can_undo()` iff
/// `current_index > 0`. `can_redo()` iff `current_index < states.len()`.
pub struct UndoStack {
    states: Vec<UndoState>,
    current_index: usize,
    max_states: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self { states: Vec::new(), current_index: 0, max_states: DEFAULT_MAX_STATES }
    }

    pub fn with_max_states(max_states: usize) -> Self {
        Self { states: Vec::new(), current_index: 0, max_states }
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.states.len()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Push a new state. If `current_index < states.len()`, truncates the
    /// tail first (branch pruning) so `can_redo()` becomes false. Then
    /// deep-copies every snapshot, appends, and evicts from the front while
    /// over capacity, decrementing `current_index` by the eviction count
    /// (saturating at 0).
    pub fn push_state(&mut self, snapshots: Vec<TileGrid>, description: impl Into<String>) {
        if self.current_index < self.states.len() {
            self.states.truncate(self.current_index);
        }
        self.states.push(UndoState { description: description.into(), timestamp_secs: now_secs(), snapshots });
        self.current_index = self.states.len();

        let mut evicted = 0;
        while self.states.len() > self.max_states {
            self.states.remove(0);
            evicted += 1;
        }
        self.current_index = self.current_index.saturating_sub(evicted);
        debug!(
            "UndoStack::push_state: states={} current_index={} evicted={}",
            self.states.len(),
            self.current_index,
            evicted
        );
    }

    /// Undo: requires `can_undo()`. Decrements `current_index` and returns
    /// deep copies of the snapshots at the new index. The stack is not
    /// drained; repeated undo walks back through history.
    pub fn pop_state(&mut self) -> Option<Vec<TileGrid>> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        Some(self.states[self.current_index].snapshots.clone())
    }

    /// Redo: requires `can_redo()`. Returns deep copies of the snapshots at
    /// `current_index`, then increments it.
    pub fn redo_state(&mut self) -> Option<Vec<TileGrid>> {
        if !self.can_redo() {
            return None;
        }
        let snapshots = self.states[self.current_index].snapshots.clone();
        self.current_index += 1;
        Some(snapshots)
    }

    pub fn undo_description(&self) -> String {
        if self.current_index == 0 {
            String::new()
        } else {
            self.states[self.current_index - 1].description.clone()
        }
    }

    pub fn redo_description(&self) -> String {
        self.states.get(self.current_index).map(|s| s.description.clone()).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.current_index = 0;
    }

    /// Update the ceiling. Does not immediately trim existing history — the
    /// new ceiling only takes effect on the next `push_state`.
    pub fn set_max_states(&mut self, max_states: usize) {
        self.max_states = max_states;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
