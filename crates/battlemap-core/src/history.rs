//! Linear undo/redo log of recorded actions.

use crate::action::Action;

/// An ordered list of actions with a cursor.
///
/// Actions up to and including the cursor are active; the ones after it are
/// redo history. Recording while the cursor is behind the tail drops that
/// redo history. Stored actions are never modified.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    actions: Vec<Action>,
    /// Number of active actions (cursor + 1).
    applied: usize,
}

impl ActionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action, discarding any redo history.
    ///
    /// Returns the index of the new action, which is also the new cursor.
    pub fn record(&mut self, action: Action) -> usize {
        self.actions.truncate(self.applied);
        self.actions.push(action);
        self.applied = self.actions.len();
        self.applied - 1
    }

    /// Step the cursor back one action.
    /// Returns false (and does nothing) if nothing is active.
    pub fn undo(&mut self) -> bool {
        if self.applied == 0 {
            return false;
        }
        self.applied -= 1;
        true
    }

    /// Step the cursor forward one action.
    /// Returns false (and does nothing) if already at the tail.
    pub fn redo(&mut self) -> bool {
        if self.applied == self.actions.len() {
            return false;
        }
        self.applied += 1;
        true
    }

    /// Drop every action and move the cursor before the start.
    pub fn reset(&mut self) {
        self.actions.clear();
        self.applied = 0;
    }

    /// Index of the last active action, or `None` when nothing is active.
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    /// Active actions in recording order.
    pub fn active(&self) -> &[Action] {
        &self.actions[..self.applied]
    }

    /// Retained redo history.
    pub fn redo_tail(&self) -> &[Action] {
        &self.actions[self.applied..]
    }

    /// All stored actions, active or not.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Total number of stored actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
