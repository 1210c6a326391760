use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::expansion::PanelMode;
use crate::schema::SUBTABLE_WIDTH;
use crate::storage::{FileStorage, Storage};
use crate::theme::Theme;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Width given to subtable columns while flat rows are expanded
pub const FLAT_SUBTABLE_WIDTH: usize = 360;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rows per data chunk
    pub chunk_size: usize,
    /// Presentation used by a fresh click when nothing is remembered
    pub panel_mode: PanelMode,
    pub subtable_width: usize,
    pub flat_subtable_width: usize,
    /// Cap on synthetic rows created by expand-all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_expanded_rows: Option<usize>,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            panel_mode: PanelMode::default(),
            subtable_width: SUBTABLE_WIDTH,
            flat_subtable_width: FLAT_SUBTABLE_WIDTH,
            max_expanded_rows: None,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GridError::io(path, e))?;
        Self::parse(&content).map_err(|message| GridError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.chunk_size == 0 {
            return Err("chunk_size must be at least 1".to_string());
        }
        Ok(config)
    }
}

/// Remembers the global panel mode across sessions
pub trait ModeStore {
    fn load(&self) -> Option<PanelMode>;
    fn save(&self, mode: PanelMode) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ModeState {
    panel_mode: PanelMode,
}

/// Mode state kept in a small TOML file
#[derive(Debug, Clone)]
pub struct FileModeStore {
    path: PathBuf,
}

impl FileModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModeStore for FileModeStore {
    fn load(&self) -> Option<PanelMode> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<ModeState>(&content) {
            Ok(state) => Some(state.panel_mode),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable mode state");
                None
            }
        }
    }

    fn save(&self, mode: PanelMode) -> Result<()> {
        let content = toml::to_string(&ModeState { panel_mode: mode }).map_err(|e| {
            GridError::Config {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;
        FileStorage.write(&self.path, content.as_bytes())?;
        debug!(%mode, path = %self.path.display(), "panel mode saved");
        Ok(())
    }
}

/// Mode state held in memory. Clones share the stored mode.
#[derive(Debug, Clone, Default)]
pub struct MemoryModeStore {
    mode: Rc<Cell<Option<PanelMode>>>,
}

impl MemoryModeStore {
    pub fn new(mode: Option<PanelMode>) -> Self {
        Self { mode: Rc::new(Cell::new(mode)) }
    }
}

impl ModeStore for MemoryModeStore {
    fn load(&self) -> Option<PanelMode> {
        self.mode.get()
    }

    fn save(&self, mode: PanelMode) -> Result<()> {
        self.mode.set(Some(mode));
        Ok(())
    }
}
