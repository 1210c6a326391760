use serde_json::Value;

use crate::record::FieldPath;

/// An edit as it was actually applied to the records
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEdit {
    pub row_index: usize,
    pub field: FieldPath,
    /// Value before the edit, `None` if the key was absent
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Linear undo history with a cursor and a saved marker
#[derive(Debug)]
pub struct History {
    edits: Vec<AppliedEdit>,
    cursor: usize,
    /// `None` once the saved position has been discarded by a new branch
    saved: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self {
            edits: Vec::new(),
            cursor: 0,
            saved: Some(0),
        }
    }

    /// Record an edit at the cursor (discards anything redoable)
    pub fn record(&mut self, edit: AppliedEdit) {
        if self.saved.is_some_and(|saved| saved > self.cursor) {
            self.saved = None;
        }
        self.edits.truncate(self.cursor);
        self.edits.push(edit);
        self.cursor += 1;
    }

    /// Step back, returning the edit to revert
    pub fn undo(&mut self) -> Option<&AppliedEdit> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.edits.get(self.cursor)
    }

    /// Step forward, returning the edit to re-apply
    pub fn redo(&mut self) -> Option<&AppliedEdit> {
        let edit = self.edits.get(self.cursor)?;
        self.cursor += 1;
        Some(edit)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.edits.len()
    }

    /// Peek at the next undo edit without moving
    pub fn peek_undo(&self) -> Option<&AppliedEdit> {
        self.cursor.checked_sub(1).and_then(|i| self.edits.get(i))
    }

    /// Peek at the next redo edit without moving
    pub fn peek_redo(&self) -> Option<&AppliedEdit> {
        self.edits.get(self.cursor)
    }

    pub fn mark_saved(&mut self) {
        self.saved = Some(self.cursor);
    }

    pub fn is_dirty(&self) -> bool {
        self.saved != Some(self.cursor)
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn saved_index(&self) -> Option<usize> {
        self.saved
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}
