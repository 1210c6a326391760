pub mod history;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::{self, ParseError};
use crate::error::{GridError, Result};
use crate::record::{CellEdit, FieldPath, Record};
use crate::storage::Storage;
use history::{AppliedEdit, History};

/// Notifications emitted by a document, drained in order by its owner
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// Record content changed (edit, undo, redo, revert)
    ContentChanged,
    /// The undo history moved; `label` names the edit involved
    HistoryChanged {
        label: String,
        can_undo: bool,
        can_redo: bool,
    },
    Saved { path: PathBuf },
    /// Records were replaced wholesale from the backing file
    Reverted,
    /// Lines skipped while loading
    ParseWarnings(Vec<ParseError>),
}

/// A written backup copy, removable later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
}

impl Backup {
    /// Remove the backup. Failures are ignored.
    pub fn delete(&self, storage: &dyn Storage) {
        if let Err(e) = storage.delete(&self.path) {
            debug!(error = %e, "failed to delete backup");
        }
    }
}

/// The record set being edited, with its undo history
#[derive(Debug, Default)]
pub struct Document {
    path: Option<PathBuf>,
    records: Vec<Record>,
    history: History,
    parse_errors: Vec<ParseError>,
    events: Vec<DocumentEvent>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from raw bytes with no backing file
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut doc = Self::new();
        doc.load(bytes);
        doc
    }

    pub fn open(path: impl Into<PathBuf>, storage: &dyn Storage) -> Result<Self> {
        let path = path.into();
        let bytes = storage.load(&path)?;
        let mut doc = Self::new();
        doc.path = Some(path);
        doc.load(&bytes);
        info!(path = %doc.file_name(), records = doc.len(), "document loaded");
        Ok(doc)
    }

    /// Replace the record set from raw bytes and reset the history.
    /// Bad lines are reported as a warning event, never as a failure.
    pub fn load(&mut self, bytes: &[u8]) {
        let result = codec::parse_bytes(bytes);
        self.records = result.records;
        self.history.clear();
        self.parse_errors = result.errors;

        if !self.parse_errors.is_empty() {
            warn!(
                path = %self.file_name(),
                skipped = self.parse_errors.len(),
                "parse warnings: line(s) skipped"
            );
            for e in &self.parse_errors {
                warn!(line = e.line, message = %e.message, "skipped line");
            }
            self.events.push(DocumentEvent::ParseWarnings(self.parse_errors.clone()));
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_name(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply an edit and record it. Edits addressing a row or nested element
    /// that does not exist are dropped without error.
    pub fn apply_edit(&mut self, edit: CellEdit) -> bool {
        let CellEdit { row_index, field, old_value, new_value } = edit;

        let rows = self.records.len();
        let Some(record) = self.records.get_mut(row_index) else {
            debug!(row_index, rows, "ignoring edit for row out of range");
            return false;
        };

        let previous = match field.write(record, Some(new_value.clone())) {
            Ok(previous) => previous,
            Err(e) => {
                debug!(row_index, error = %e, "ignoring edit");
                return false;
            }
        };

        if previous.as_ref().unwrap_or(&serde_json::Value::Null) != &old_value {
            debug!(row_index, %field, "edit old value differs from record, keeping record value");
        }

        let label = format!("Edit {}", field);
        self.history.record(AppliedEdit {
            row_index,
            field,
            old_value: previous,
            new_value,
        });
        self.push_history_event(label);
        self.events.push(DocumentEvent::ContentChanged);
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(edit) = self.history.undo().cloned() else {
            return false;
        };
        self.write_value(edit.row_index, &edit.field, edit.old_value);
        self.push_history_event(format!("Undo Edit {}", edit.field));
        self.events.push(DocumentEvent::ContentChanged);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.history.redo().cloned() else {
            return false;
        };
        self.write_value(edit.row_index, &edit.field, Some(edit.new_value));
        self.push_history_event(format!("Redo Edit {}", edit.field));
        self.events.push(DocumentEvent::ContentChanged);
        true
    }

    fn write_value(&mut self, row: usize, field: &FieldPath, value: Option<serde_json::Value>) {
        let Some(record) = self.records.get_mut(row) else {
            debug!(row, "history edit addresses a missing row");
            return;
        };
        if let Err(e) = field.write(record, value) {
            debug!(row, error = %e, "history edit could not be re-applied");
        }
    }

    fn push_history_event(&mut self, label: String) {
        self.events.push(DocumentEvent::HistoryChanged {
            label,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    /// Write to the backing file
    pub fn save(&mut self, storage: &dyn Storage) -> Result<()> {
        let path = self.path.clone().ok_or(GridError::NoBackingFile)?;
        self.write_to(&path, storage)?;
        self.history.mark_saved();
        info!(path = %path.display(), records = self.len(), "document saved");
        self.events.push(DocumentEvent::Saved { path });
        Ok(())
    }

    /// Write to `target`, which becomes the backing file
    pub fn save_as(&mut self, target: impl Into<PathBuf>, storage: &dyn Storage) -> Result<()> {
        let target = target.into();
        self.write_to(&target, storage)?;
        self.history.mark_saved();
        self.path = Some(target.clone());
        info!(path = %target.display(), records = self.len(), "document saved");
        self.events.push(DocumentEvent::Saved { path: target });
        Ok(())
    }

    /// Write a copy to `destination` without touching the saved state
    pub fn backup(&self, destination: impl Into<PathBuf>, storage: &dyn Storage) -> Result<Backup> {
        let path = destination.into();
        self.write_to(&path, storage)?;
        Ok(Backup { path })
    }

    /// Reload from the backing file, discarding all history
    pub fn revert(&mut self, storage: &dyn Storage) -> Result<()> {
        let path = self.path.clone().ok_or(GridError::NoBackingFile)?;
        let bytes = storage.load(&path)?;
        self.load(&bytes);
        info!(path = %path.display(), records = self.len(), "document reverted");
        self.events.push(DocumentEvent::Reverted);
        self.events.push(DocumentEvent::ContentChanged);
        Ok(())
    }

    fn write_to(&self, path: &Path, storage: &dyn Storage) -> Result<()> {
        let bytes = codec::serialize_to_bytes(&self.records)?;
        storage.write(path, &bytes)
    }

    pub fn take_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }
}
