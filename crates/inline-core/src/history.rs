use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::tree::Node;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub snapshot: String,
    pub caret: usize,
}

impl UndoEntry {
    pub fn capture(nodes: &[Node], caret: usize) -> Result<Self, EditorError> {
        let snapshot = serde_json::to_string(nodes).map_err(EditorError::Snapshot)?;
        Ok(Self { snapshot, caret })
    }

    pub fn nodes(&self) -> Result<Vec<Node>, EditorError> {
        serde_json::from_str(&self.snapshot).map_err(EditorError::Snapshot)
    }
}

/// Snapshot undo stack. The top of `undo` is always the current state, so an
/// undo needs two entries.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
    max_undo: usize,
}

impl History {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_undo: max_undo.max(1),
        }
    }

    /// Drops everything and starts over from `entry`.
    pub fn seed(&mut self, entry: UndoEntry) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push(entry);
    }

    /// Pushes a new state unless it matches the current one. A new state
    /// clears the redo stack.
    pub fn record(&mut self, entry: UndoEntry) -> bool {
        if self
            .undo
            .last()
            .is_some_and(|top| top.snapshot == entry.snapshot)
        {
            return false;
        }
        tracing::trace!(depth = self.undo.len() + 1, "recorded snapshot");
        self.undo.push(entry);
        self.redo.clear();
        if self.undo.len() > self.max_undo {
            self.undo.remove(0);
        }
        true
    }

    /// Steps back; returns the state to restore.
    pub fn undo(&mut self) -> Option<&UndoEntry> {
        if self.undo.len() < 2 {
            return None;
        }
        let current = self.undo.pop()?;
        self.redo.push(current);
        self.undo.last()
    }

    /// Steps forward; returns the state to restore.
    pub fn redo(&mut self) -> Option<&UndoEntry> {
        let next = self.redo.pop()?;
        self.undo.push(next);
        self.undo.last()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn current(&self) -> Option<&UndoEntry> {
        self.undo.last()
    }
}
