//! Messages exchanged between the host and the renderer

use serde::{Deserialize, Serialize};

use crate::record::{CellEdit, Record};
use crate::schema::ColumnSchema;
use crate::theme::Theme;

/// Host to renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    Init {
        columns: Vec<ColumnSchema>,
        #[serde(rename = "totalRows")]
        total_rows: usize,
    },
    DataChunk {
        #[serde(rename = "startIndex")]
        start_index: usize,
        rows: Vec<Record>,
    },
    /// Programmatic edit the renderer mirrors into its local rows
    ApplyEdit { edit: CellEdit },
    ThemeChanged { theme: Theme },
}

/// Renderer to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RendererMessage {
    Ready,
    CellEdit { edit: CellEdit },
    RequestChunk {
        #[serde(rename = "startIndex")]
        start_index: usize,
        count: usize,
    },
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Init { .. } => "init",
            HostMessage::DataChunk { .. } => "data-chunk",
            HostMessage::ApplyEdit { .. } => "apply-edit",
            HostMessage::ThemeChanged { .. } => "theme-changed",
        }
    }
}

impl RendererMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            RendererMessage::Ready => "ready",
            RendererMessage::CellEdit { .. } => "cell-edit",
            RendererMessage::RequestChunk { .. } => "request-chunk",
        }
    }
}
