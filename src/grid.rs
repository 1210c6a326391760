//! Renderer-side grid model
//!
//! Holds the renderer's copy of the rows as they arrive in chunks, the
//! column set, expansion state, column visibility and search. Everything
//! the renderer draws is derived from here; the document itself lives on
//! the host.

pub mod columns;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, ModeStore};
use crate::expansion::{
    ClickOutcome, DisplayRow, ExpansionEvent, ExpansionKey, ExpansionState, PanelMode, SubtableData,
};
use crate::protocol::{HostMessage, RendererMessage};
use crate::record::{CellEdit, Record};
use crate::router::{self, CellEditEvent};
use crate::schema::ColumnSchema;
use crate::search::{SearchMatch, SearchState};
use crate::theme::Theme;
use columns::ColumnView;

const DETAIL_MIN_HEIGHT: usize = 120;
const DETAIL_MAX_HEIGHT: usize = 300;

/// Preferred height of an inline detail row showing `rows` nested rows
pub fn detail_row_height(rows: usize) -> usize {
    (32 + 24 * rows + 16).clamp(DETAIL_MIN_HEIGHT, DETAIL_MAX_HEIGHT)
}

/// Row and column counters shown under the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoBar {
    pub rows: usize,
    pub visible_cols: usize,
    pub total_cols: usize,
}

impl InfoBar {
    pub fn row_text(&self) -> String {
        format!("Rows: {}", self.rows)
    }

    pub fn col_text(&self) -> String {
        if self.visible_cols < self.total_cols {
            format!("Cols: {} / {}", self.visible_cols, self.total_cols)
        } else {
            format!("Cols: {}", self.total_cols)
        }
    }
}

impl fmt::Display for InfoBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.row_text(), self.col_text())
    }
}

pub struct GridModel {
    columns: Vec<ColumnSchema>,
    column_view: ColumnView,
    total_rows: usize,
    rows: Vec<Option<Record>>,
    display: Vec<DisplayRow>,
    expansion: ExpansionState,
    search: SearchState,
    theme: Theme,
    chunk_size: usize,
    subtable_width: usize,
    flat_subtable_width: usize,
    mode_store: Option<Box<dyn ModeStore>>,
}

impl GridModel {
    pub fn new(config: &Config) -> Self {
        Self {
            columns: Vec::new(),
            column_view: ColumnView::default(),
            total_rows: 0,
            rows: Vec::new(),
            display: Vec::new(),
            expansion: ExpansionState::new(config.panel_mode)
                .with_max_expanded_rows(config.max_expanded_rows),
            search: SearchState::new(),
            theme: config.theme,
            chunk_size: config.chunk_size.max(1),
            subtable_width: config.subtable_width,
            flat_subtable_width: config.flat_subtable_width,
            mode_store: None,
        }
    }

    /// Remember the panel mode through `store`, starting from whatever it
    /// holds
    pub fn with_mode_store(mut self, store: Box<dyn ModeStore>) -> Self {
        if let Some(mode) = store.load() {
            debug!(%mode, "restored panel mode");
            self.expansion.set_mode(mode);
        }
        self.mode_store = Some(store);
        self
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn loaded_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.rows.len() >= self.total_rows && self.rows.iter().all(Option::is_some)
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    pub fn display_rows(&self) -> &[DisplayRow] {
        &self.display
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn mode(&self) -> PanelMode {
        self.expansion.mode()
    }

    // === Host messages ===

    pub fn handle(&mut self, message: HostMessage) -> Vec<RendererMessage> {
        debug!(kind = message.kind(), "host message");
        match message {
            HostMessage::Init { columns, total_rows } => {
                self.init(columns, total_rows);
                Vec::new()
            }
            HostMessage::DataChunk { start_index, rows } => {
                self.store_chunk(start_index, rows).into_iter().collect()
            }
            HostMessage::ApplyEdit { edit } => {
                self.apply_local(&edit);
                self.refresh_display();
                Vec::new()
            }
            HostMessage::ThemeChanged { theme } => {
                self.theme = theme;
                Vec::new()
            }
        }
    }

    fn init(&mut self, columns: Vec<ColumnSchema>, total_rows: usize) {
        self.expansion.reset();
        self.column_view.reset(&columns, self.subtable_width);
        self.columns = columns;
        self.total_rows = total_rows;
        self.rows.clear();
        self.display.clear();
        self.search.clear();
        info!(columns = self.columns.len(), total_rows, "grid initialized");
    }

    /// Store a chunk and ask for the next one while rows are missing
    fn store_chunk(&mut self, start_index: usize, rows: Vec<Record>) -> Option<RendererMessage> {
        let received = rows.len();
        let end = start_index + received;
        if self.rows.len() < end {
            self.rows.resize(end, None);
        }
        for (slot, record) in self.rows[start_index..end].iter_mut().zip(rows) {
            *slot = Some(record);
        }
        self.refresh_display();
        debug!(start_index, received, loaded = self.loaded_rows(), "chunk stored");

        if end >= self.total_rows {
            return None;
        }
        if received == 0 {
            warn!(start_index, total_rows = self.total_rows, "empty chunk before end of data");
            return None;
        }
        Some(RendererMessage::RequestChunk {
            start_index: end,
            count: self.chunk_size,
        })
    }

    /// Mirror an edit into the local rows and any expansion showing it
    fn apply_local(&mut self, edit: &CellEdit) -> bool {
        let Some(Some(record)) = self.rows.get_mut(edit.row_index) else {
            debug!(row = edit.row_index, "edit for row not loaded");
            return false;
        };
        if let Err(e) = edit.field.write(record, Some(edit.new_value.clone())) {
            debug!(row = edit.row_index, error = %e, "edit not mirrored");
            return false;
        }

        let field = edit.field.top_field().to_string();
        let data = self.subtable_data(edit.row_index, &field);
        self.expansion
            .refresh_data(&ExpansionKey::new(edit.row_index, field), data);
        true
    }

    fn refresh_display(&mut self) {
        let indices = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_some())
            .map(|(i, _)| i);
        self.display = self.expansion.display_rows(indices);

        if !self.search.query().is_empty() {
            let fields = self.column_view.visible_fields();
            self.search.refresh(&self.display, &self.rows, &fields);
        }
    }

    fn subtable_data(&self, row: usize, field: &str) -> SubtableData {
        match self.record(row).and_then(|r| r.get(field)) {
            Some(Value::Array(items)) => Rc::new(items.clone()),
            _ => Rc::new(Vec::new()),
        }
    }

    // === Editing ===

    /// Route a cell edit, mirror it locally, and produce the message for the
    /// host. Non-editable cells produce nothing.
    pub fn edit_cell(&mut self, event: CellEditEvent) -> Option<RendererMessage> {
        let edit = router::route(event, &self.display, &self.columns)?;
        if !self.apply_local(&edit) {
            return None;
        }
        self.refresh_display();
        Some(RendererMessage::CellEdit { edit })
    }

    pub fn is_cell_editable(&self, display_row: usize, field: &str) -> bool {
        match self.display.get(display_row) {
            Some(DisplayRow::Record { .. }) => self
                .columns
                .iter()
                .find(|c| c.field == field)
                .map_or(true, |c| c.column_type.is_editable()),
            Some(DisplayRow::Flat { field: subtable, values, .. }) => {
                router::flat_cell_type(subtable, values, field).is_some_and(|t| t.is_editable())
            }
            _ => false,
        }
    }

    /// Preferred height for detail rows; other rows use the grid default
    pub fn row_height(&self, display_row: usize) -> Option<usize> {
        match self.display.get(display_row)? {
            DisplayRow::Detail { rows, .. } => Some(detail_row_height(rows.len())),
            _ => None,
        }
    }

    // === Expansion ===

    pub fn click_subtable(&mut self, row: usize, field: &str) -> ClickOutcome {
        let data = self.subtable_data(row, field);
        let outcome = self.expansion.click(ExpansionKey::new(row, field), data);
        self.refresh_display();
        outcome
    }

    pub fn toggle_inline(&mut self, row: usize, field: &str) -> bool {
        let data = self.subtable_data(row, field);
        let expanded = self.expansion.toggle_inline(ExpansionKey::new(row, field), data);
        self.refresh_display();
        expanded
    }

    pub fn toggle_flat(&mut self, row: usize, field: &str) -> bool {
        let data = self.subtable_data(row, field);
        let expanded = self.expansion.toggle_flat(ExpansionKey::new(row, field), data);
        self.refresh_display();
        expanded
    }

    pub fn expand_all_inline(&mut self) -> bool {
        let fields = self.column_view.subtable_fields().to_vec();
        let rows = self.rows.iter().enumerate().filter_map(|(i, r)| r.as_ref().map(|r| (i, r)));
        let expanded = self.expansion.expand_all_inline(rows, &fields);
        if self.expansion.flat_count() == 0 {
            self.column_view.restore_widths();
        }
        self.refresh_display();
        expanded
    }

    pub fn expand_all_flat(&mut self) -> bool {
        let fields = self.column_view.subtable_fields().to_vec();
        let rows = self.rows.iter().enumerate().filter_map(|(i, r)| r.as_ref().map(|r| (i, r)));
        let expanded = self.expansion.expand_all_flat(rows, &fields);
        if expanded {
            self.column_view.widen_subtables(self.flat_subtable_width);
        } else {
            self.column_view.restore_widths();
        }
        self.refresh_display();
        expanded
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
        self.column_view.restore_widths();
        self.refresh_display();
    }

    pub fn close_panel(&mut self) -> bool {
        self.expansion.close_panel()
    }

    /// Change the presentation used by fresh clicks
    pub fn set_mode(&mut self, mode: PanelMode) {
        self.expansion.set_mode(mode);
        self.persist_mode();
    }

    /// Move one subtable cell into another presentation
    pub fn switch_presentation(&mut self, row: usize, field: &str, target: PanelMode) {
        let before = self.expansion.mode();
        let key = ExpansionKey::new(row, field);
        let data = self.subtable_data(row, field);
        self.expansion.switch_presentation(key, target, data);
        if self.expansion.mode() != before {
            self.persist_mode();
        }
        self.refresh_display();
    }

    /// The open panel's switch control
    pub fn cycle_panel_mode(&mut self) -> Option<PanelMode> {
        let target = self.expansion.cycle_panel_mode()?;
        self.persist_mode();
        self.refresh_display();
        Some(target)
    }

    fn persist_mode(&self) {
        let Some(store) = &self.mode_store else { return };
        if let Err(e) = store.save(self.expansion.mode()) {
            warn!(error = %e, "failed to remember panel mode");
        }
    }

    pub fn take_expansion_events(&mut self) -> Vec<ExpansionEvent> {
        self.expansion.take_events()
    }

    // === Columns ===

    pub fn set_column_visible(&mut self, field: &str, visible: bool) {
        self.column_view.set_visible(field, visible);
    }

    pub fn show_all_columns(&mut self) {
        self.column_view.show_all();
    }

    pub fn hide_all_columns(&mut self) {
        self.column_view.hide_all();
    }

    pub fn reset_column_visibility(&mut self) {
        self.column_view.show_all();
    }

    pub fn is_column_visible(&self, field: &str) -> bool {
        self.column_view.is_visible(field)
    }

    pub fn visible_fields(&self) -> Vec<String> {
        self.column_view.visible_fields()
    }

    pub fn all_fields(&self) -> &[String] {
        self.column_view.all_fields()
    }

    pub fn column_width(&self, field: &str) -> Option<usize> {
        self.column_view.width(field)
    }

    pub fn info_bar(&self) -> InfoBar {
        InfoBar {
            rows: self.total_rows,
            visible_cols: self.column_view.visible_count(),
            total_cols: self.columns.len(),
        }
    }

    // === Search ===

    pub fn search(&mut self, query: &str) -> usize {
        self.run_search(query)
    }

    fn run_search(&mut self, query: &str) -> usize {
        let fields = self.column_view.visible_fields();
        self.search.search(query, &self.display, &self.rows, &fields)
    }

    pub fn search_next(&mut self) -> Option<&SearchMatch> {
        self.search.next()
    }

    pub fn search_prev(&mut self) -> Option<&SearchMatch> {
        self.search.prev()
    }

    pub fn search_status(&self) -> String {
        self.search.status()
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }
}

#[cfg(test)]
mod test;
