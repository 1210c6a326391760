use tracing::debug;

use super::{ExpansionEvent, ExpansionKey, ExpansionState, PanelMode, SubtableData};

/// The one subtable currently shown in a modal or docked panel
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePanel {
    pub key: ExpansionKey,
    pub mode: PanelMode,
    pub data: SubtableData,
}

impl ActivePanel {
    /// Header text, with the row shown one-based
    pub fn title(&self) -> String {
        format!("{} (Row {})", self.key.field, self.key.row + 1)
    }
}

/// Result of clicking a subtable cell's expand control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Expanded(PanelMode),
    Collapsed(PanelMode),
    /// Nothing to show (empty subtable)
    Ignored,
}

impl ExpansionState {
    pub fn active_panel(&self) -> Option<&ActivePanel> {
        self.panel.as_ref()
    }

    pub fn is_panel_open(&self, key: &ExpansionKey) -> bool {
        self.panel.as_ref().is_some_and(|p| p.key == *key)
    }

    /// Handle a click on the expand control of `key`, according to the
    /// global mode.
    pub fn click(&mut self, key: ExpansionKey, data: SubtableData) -> ClickOutcome {
        match self.mode {
            PanelMode::Inline => {
                self.close_panel();
                if self.toggle_inline(key, data) {
                    ClickOutcome::Expanded(PanelMode::Inline)
                } else {
                    ClickOutcome::Collapsed(PanelMode::Inline)
                }
            }
            PanelMode::Flat => {
                self.close_panel();
                if self.toggle_flat(key, data) {
                    ClickOutcome::Expanded(PanelMode::Flat)
                } else {
                    ClickOutcome::Collapsed(PanelMode::Flat)
                }
            }
            mode @ (PanelMode::Modal | PanelMode::Docked) => {
                if self.is_panel_open(&key) {
                    self.close_panel();
                    return ClickOutcome::Collapsed(mode);
                }
                self.close_panel();
                if data.is_empty() {
                    return ClickOutcome::Ignored;
                }
                self.open_panel(key, mode, data);
                ClickOutcome::Expanded(mode)
            }
        }
    }

    /// Show `key` in the singleton panel, replacing whatever was shown
    pub fn open_panel(&mut self, key: ExpansionKey, mode: PanelMode, data: SubtableData) {
        self.close_panel();
        debug!(%key, %mode, items = data.len(), "panel open");
        self.events.push(ExpansionEvent::PanelOpened { key: key.clone(), mode });
        self.panel = Some(ActivePanel { key, mode, data });
    }

    /// Close the singleton panel. Returns whether one was open.
    pub fn close_panel(&mut self) -> bool {
        let Some(panel) = self.panel.take() else {
            return false;
        };
        debug!(key = %panel.key, "panel close");
        self.events.push(ExpansionEvent::PanelClosed(panel.key));
        true
    }

    /// Move `key` from whatever presentation it has into `target`.
    ///
    /// Switching into a singleton panel, or out of one, makes the target the
    /// global mode. Switching between inline and flat leaves the global mode
    /// alone.
    pub fn switch_presentation(
        &mut self,
        key: ExpansionKey,
        target: PanelMode,
        data: SubtableData,
    ) {
        let from_panel = self.is_panel_open(&key);
        if from_panel {
            self.close_panel();
        }
        if target.is_singleton() || from_panel {
            self.mode = target;
        }

        match target {
            PanelMode::Modal | PanelMode::Docked => {
                self.collapse_inline(&key);
                self.collapse_flat(&key);
                if data.is_empty() {
                    return;
                }
                self.open_panel(key, target, data);
            }
            PanelMode::Inline => self.expand_inline(key, data),
            PanelMode::Flat => self.expand_flat(key, data),
        }
    }

    /// Advance the open panel along modal -> docked -> inline
    pub fn cycle_panel_mode(&mut self) -> Option<PanelMode> {
        let panel = self.panel.as_ref()?;
        let target = panel.mode.next_panel_mode();
        let key = panel.key.clone();
        let data = panel.data.clone();
        self.switch_presentation(key, target, data);
        Some(target)
    }
}
