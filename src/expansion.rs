//! Row expansion state for subtable cells
//!
//! Every subtable cell is identified by an [`ExpansionKey`]. A key can be
//! expanded inline (a detail row under its parent) or flat (one merged row
//! per nested element), never both. Independently of those two maps, at most
//! one key can be shown in a singleton panel (modal overlay or docked side
//! panel). The global [`PanelMode`] only decides what a fresh click on an
//! expand control does.

pub mod display;
pub mod panel;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::record::Record;
pub use display::DisplayRow;
pub use panel::{ActivePanel, ClickOutcome};

/// Nested elements of one subtable cell, shared between state and display rows
pub type SubtableData = Rc<Vec<Value>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpansionKey {
    pub row: usize,
    pub field: String,
}

impl ExpansionKey {
    pub fn new(row: usize, field: impl Into<String>) -> Self {
        Self { row, field: field.into() }
    }

    /// First possible key of a row, for range scans
    fn row_start(row: usize) -> Self {
        Self { row, field: String::new() }
    }
}

impl fmt::Display for ExpansionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelMode {
    Modal,
    Docked,
    Inline,
    Flat,
}

impl PanelMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            PanelMode::Modal => "modal",
            PanelMode::Docked => "docked",
            PanelMode::Inline => "inline",
            PanelMode::Flat => "flat",
        }
    }

    /// Modal and docked show one subtable at a time
    pub fn is_singleton(&self) -> bool {
        matches!(self, PanelMode::Modal | PanelMode::Docked)
    }

    /// Next mode offered by a singleton panel's switch control
    pub fn next_panel_mode(&self) -> PanelMode {
        match self {
            PanelMode::Modal => PanelMode::Docked,
            PanelMode::Docked => PanelMode::Inline,
            PanelMode::Inline => PanelMode::Flat,
            PanelMode::Flat => PanelMode::Modal,
        }
    }
}

impl Default for PanelMode {
    fn default() -> Self {
        PanelMode::Modal
    }
}

impl fmt::Display for PanelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PanelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modal" => Ok(PanelMode::Modal),
            "docked" => Ok(PanelMode::Docked),
            "inline" => Ok(PanelMode::Inline),
            "flat" => Ok(PanelMode::Flat),
            other => Err(format!("unknown panel mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Inline,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionEntry {
    pub key: ExpansionKey,
    /// Snapshot of the array at expansion time
    pub data: SubtableData,
    pub presentation: Presentation,
    /// Expansion order, used to order entries within one row
    seq: u64,
}

/// Resource lifecycle notifications for the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionEvent {
    /// An inline detail went away; its nested grid can be destroyed
    DetailReleased(ExpansionKey),
    PanelOpened { key: ExpansionKey, mode: PanelMode },
    PanelClosed(ExpansionKey),
}

#[derive(Debug, Default)]
pub struct ExpansionState {
    mode: PanelMode,
    inline: BTreeMap<ExpansionKey, ExpansionEntry>,
    flat: BTreeMap<ExpansionKey, ExpansionEntry>,
    panel: Option<ActivePanel>,
    /// Cap on synthetic rows created by a bulk expand
    max_expanded_rows: Option<usize>,
    next_seq: u64,
    events: Vec<ExpansionEvent>,
}

impl ExpansionState {
    pub fn new(mode: PanelMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_max_expanded_rows(mut self, max: Option<usize>) -> Self {
        self.max_expanded_rows = max;
        self
    }

    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    /// Change what fresh clicks do. Open expansions are left alone.
    pub fn set_mode(&mut self, mode: PanelMode) {
        self.mode = mode;
    }

    pub fn is_inline(&self, key: &ExpansionKey) -> bool {
        self.inline.contains_key(key)
    }

    pub fn is_flat(&self, key: &ExpansionKey) -> bool {
        self.flat.contains_key(key)
    }

    pub fn inline_entries(&self) -> impl Iterator<Item = &ExpansionEntry> {
        self.inline.values()
    }

    pub fn flat_entries(&self) -> impl Iterator<Item = &ExpansionEntry> {
        self.flat.values()
    }

    pub fn inline_count(&self) -> usize {
        self.inline.len()
    }

    pub fn flat_count(&self) -> usize {
        self.flat.len()
    }

    pub fn has_expansions(&self) -> bool {
        !self.inline.is_empty() || !self.flat.is_empty() || self.panel.is_some()
    }

    // === Per-key transitions ===

    /// Collapse if inline, otherwise expand inline (evicting a flat entry).
    /// Returns whether the key is now inline.
    pub fn toggle_inline(&mut self, key: ExpansionKey, data: SubtableData) -> bool {
        if self.collapse_inline(&key) {
            return false;
        }
        self.expand_inline(key, data);
        true
    }

    /// Collapse if flat, otherwise expand flat (evicting an inline entry).
    /// Returns whether the key is now flat.
    pub fn toggle_flat(&mut self, key: ExpansionKey, data: SubtableData) -> bool {
        if self.collapse_flat(&key) {
            return false;
        }
        self.expand_flat(key, data);
        true
    }

    /// Expand inline, replacing any existing inline snapshot
    pub fn expand_inline(&mut self, key: ExpansionKey, data: SubtableData) {
        if self.flat.remove(&key).is_some() {
            debug!(%key, "flat expansion evicted by inline");
        }
        debug!(%key, items = data.len(), "inline expand");
        self.insert(key, data, Presentation::Inline);
    }

    /// Expand flat, replacing any existing flat snapshot
    pub fn expand_flat(&mut self, key: ExpansionKey, data: SubtableData) {
        if self.inline.remove(&key).is_some() {
            debug!(%key, "inline expansion evicted by flat");
            self.events.push(ExpansionEvent::DetailReleased(key.clone()));
        }
        debug!(%key, items = data.len(), "flat expand");
        self.insert(key, data, Presentation::Flat);
    }

    /// Re-expanding a key already present keeps its place in the order
    fn insert(&mut self, key: ExpansionKey, data: SubtableData, presentation: Presentation) {
        let map = match presentation {
            Presentation::Inline => &mut self.inline,
            Presentation::Flat => &mut self.flat,
        };
        if let Some(entry) = map.get_mut(&key) {
            entry.data = data;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        map.insert(key.clone(), ExpansionEntry { key, data, presentation, seq });
    }

    pub fn collapse_inline(&mut self, key: &ExpansionKey) -> bool {
        if self.inline.remove(key).is_none() {
            return false;
        }
        debug!(%key, "inline collapse");
        self.events.push(ExpansionEvent::DetailReleased(key.clone()));
        true
    }

    pub fn collapse_flat(&mut self, key: &ExpansionKey) -> bool {
        if self.flat.remove(key).is_none() {
            return false;
        }
        debug!(%key, "flat collapse");
        true
    }

    // === Bulk transitions ===

    /// Collapse every inline expansion if there is any; otherwise clear all
    /// flat expansions and expand every non-empty subtable cell inline.
    /// Returns whether things are now expanded.
    pub fn expand_all_inline<'a, I>(&mut self, rows: I, subtable_fields: &[String]) -> bool
    where
        I: IntoIterator<Item = (usize, &'a Record)>,
    {
        if subtable_fields.is_empty() {
            return false;
        }
        if !self.inline.is_empty() {
            self.clear_inline();
            return false;
        }

        self.flat.clear();
        let cells = self.collect_cells(rows, subtable_fields, |_| 1);
        debug!(cells = cells.len(), "expand all inline");
        for (key, data) in cells {
            self.insert(key, data, Presentation::Inline);
        }
        true
    }

    /// Mirror of [`expand_all_inline`](Self::expand_all_inline) for flat rows
    pub fn expand_all_flat<'a, I>(&mut self, rows: I, subtable_fields: &[String]) -> bool
    where
        I: IntoIterator<Item = (usize, &'a Record)>,
    {
        if subtable_fields.is_empty() {
            return false;
        }
        if !self.flat.is_empty() {
            self.flat.clear();
            return false;
        }

        self.clear_inline();
        let cells = self.collect_cells(rows, subtable_fields, |items| items.len());
        debug!(cells = cells.len(), "expand all flat");
        for (key, data) in cells {
            self.insert(key, data, Presentation::Flat);
        }
        true
    }

    /// Every non-empty subtable cell, stopping once the synthetic row budget
    /// is used up. `cost` is the number of display rows a cell produces.
    fn collect_cells<'a, I>(
        &self,
        rows: I,
        subtable_fields: &[String],
        cost: impl Fn(&[Value]) -> usize,
    ) -> Vec<(ExpansionKey, SubtableData)>
    where
        I: IntoIterator<Item = (usize, &'a Record)>,
    {
        let mut cells = Vec::new();
        let mut used = 0usize;

        for (row, record) in rows {
            for field in subtable_fields {
                let Some(Value::Array(items)) = record.get(field) else { continue };
                if items.is_empty() {
                    continue;
                }

                used += cost(items);
                if self.max_expanded_rows.is_some_and(|max| used > max) {
                    warn!(
                        max = self.max_expanded_rows,
                        expanded = cells.len(),
                        "expanded row limit reached, remaining subtables left collapsed"
                    );
                    return cells;
                }

                cells.push((ExpansionKey::new(row, field.clone()), Rc::new(items.clone())));
            }
        }

        cells
    }

    fn clear_inline(&mut self) {
        let released = std::mem::take(&mut self.inline);
        self.events
            .extend(released.into_keys().map(ExpansionEvent::DetailReleased));
    }

    /// Collapse everything, including any singleton panel
    pub fn collapse_all(&mut self) {
        self.clear_inline();
        self.flat.clear();
        self.close_panel();
    }

    /// Teardown: drop all expansion state. The global mode is kept.
    pub fn reset(&mut self) {
        self.collapse_all();
    }

    /// Replace the snapshot held for `key` wherever it is expanded
    pub fn refresh_data(&mut self, key: &ExpansionKey, data: SubtableData) {
        if let Some(entry) = self.inline.get_mut(key) {
            entry.data = data.clone();
        }
        if let Some(entry) = self.flat.get_mut(key) {
            entry.data = data.clone();
        }
        if let Some(panel) = self.panel.as_mut().filter(|p| p.key == *key) {
            panel.data = data;
        }
    }

    /// Entries of one row in the order they were expanded
    fn row_entries(map: &BTreeMap<ExpansionKey, ExpansionEntry>, row: usize) -> Vec<&ExpansionEntry> {
        let mut entries: Vec<_> = map
            .range(ExpansionKey::row_start(row)..)
            .take_while(|(key, _)| key.row == row)
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    pub fn take_events(&mut self) -> Vec<ExpansionEvent> {
        std::mem::take(&mut self.events)
    }
}
