//! Host side of the renderer protocol
//!
//! A session owns one document and its persistence, answers renderer
//! messages, and turns host commands (save, undo, revert) into the
//! messages the renderer needs to stay in sync.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::document::{Document, DocumentEvent};
use crate::error::{GridError, Result};
use crate::protocol::{HostMessage, RendererMessage};
use crate::record::CellEdit;
use crate::schema::{self, ColumnSchema};
use crate::storage::Storage;
use crate::theme::Theme;

pub struct Session {
    document: Document,
    storage: Box<dyn Storage>,
    chunk_size: usize,
    theme: Theme,
    read_only: bool,
}

impl Session {
    pub fn new(document: Document, storage: Box<dyn Storage>, config: &Config) -> Self {
        Self {
            document,
            storage,
            chunk_size: config.chunk_size.max(1),
            theme: config.theme,
            read_only: false,
        }
    }

    pub fn open(path: impl Into<PathBuf>, storage: Box<dyn Storage>, config: &Config) -> Result<Self> {
        let document = Document::open(path, storage.as_ref())?;
        Ok(Self::new(document, storage, config))
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn columns(&self) -> Vec<ColumnSchema> {
        schema::analyze(self.document.records())
    }

    pub fn handle(&mut self, message: RendererMessage) -> Vec<HostMessage> {
        debug!(kind = message.kind(), "renderer message");
        match message {
            RendererMessage::Ready => self.initial_messages(),
            RendererMessage::CellEdit { edit } => {
                if self.read_only {
                    warn!(row = edit.row_index, field = %edit.field, "edit rejected: read-only");
                    return Vec::new();
                }
                self.document.apply_edit(edit);
                Vec::new()
            }
            RendererMessage::RequestChunk { start_index, count } => {
                vec![self.chunk(start_index, count)]
            }
        }
    }

    /// `init` followed by the first chunk
    pub fn initial_messages(&self) -> Vec<HostMessage> {
        vec![
            HostMessage::Init {
                columns: self.columns(),
                total_rows: self.document.len(),
            },
            self.chunk(0, self.chunk_size),
        ]
    }

    /// Rows `start..start + count`, clipped to the document
    pub fn chunk(&self, start_index: usize, count: usize) -> HostMessage {
        let records = self.document.records();
        let start = start_index.min(records.len());
        let end = start.saturating_add(count).min(records.len());
        HostMessage::DataChunk {
            start_index,
            rows: records[start..end].to_vec(),
        }
    }

    /// Apply an edit on the host's initiative and mirror it to the renderer
    pub fn apply_edit(&mut self, edit: CellEdit) -> Option<HostMessage> {
        if self.read_only {
            warn!(row = edit.row_index, field = %edit.field, "edit rejected: read-only");
            return None;
        }
        if !self.document.apply_edit(edit.clone()) {
            return None;
        }
        Some(HostMessage::ApplyEdit { edit })
    }

    pub fn undo(&mut self) -> Vec<HostMessage> {
        if !self.document.undo() {
            debug!("nothing to undo");
            return Vec::new();
        }
        self.initial_messages()
    }

    pub fn redo(&mut self) -> Vec<HostMessage> {
        if !self.document.redo() {
            debug!("nothing to redo");
            return Vec::new();
        }
        self.initial_messages()
    }

    pub fn revert(&mut self) -> Result<Vec<HostMessage>> {
        self.document.revert(self.storage.as_ref())?;
        Ok(self.initial_messages())
    }

    pub fn save(&mut self) -> Result<()> {
        if self.read_only {
            return Err(GridError::ReadOnly);
        }
        self.document.save(self.storage.as_ref())
    }

    pub fn save_as(&mut self, target: impl Into<PathBuf>) -> Result<()> {
        if self.read_only {
            return Err(GridError::ReadOnly);
        }
        self.document.save_as(target, self.storage.as_ref())
    }

    pub fn set_theme(&mut self, theme: Theme) -> HostMessage {
        if theme != self.theme {
            info!(%theme, "theme changed");
        }
        self.theme = theme;
        HostMessage::ThemeChanged { theme }
    }

    pub fn take_events(&mut self) -> Vec<DocumentEvent> {
        self.document.take_events()
    }
}
