use serde_json::{Map, Value};

use super::{ExpansionState, SubtableData};
use crate::record::{display_text, Record};

/// One row of the renderer's display sequence
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow {
    /// A document record
    Record { index: usize },
    /// Nested grid shown under its parent
    Detail {
        parent: usize,
        field: String,
        rows: SubtableData,
    },
    /// One nested element merged into a parent-shaped row
    Flat {
        parent: usize,
        field: String,
        sub_index: usize,
        values: Record,
    },
}

impl DisplayRow {
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, DisplayRow::Record { .. })
    }

    /// Index of the record this row belongs to
    pub fn parent_index(&self) -> usize {
        match self {
            DisplayRow::Record { index } => *index,
            DisplayRow::Detail { parent, .. } | DisplayRow::Flat { parent, .. } => *parent,
        }
    }

    /// Record index for real rows only
    pub fn record_index(&self) -> Option<usize> {
        match self {
            DisplayRow::Record { index } => Some(*index),
            _ => None,
        }
    }

    /// Stable identifier used by the renderer's grid
    pub fn row_id(&self) -> String {
        match self {
            DisplayRow::Record { index } => index.to_string(),
            DisplayRow::Detail { parent, field, .. } => format!("detail-{}:{}", parent, field),
            DisplayRow::Flat { parent, field, sub_index, .. } => {
                format!("flat-{}:{}:{}", parent, field, sub_index)
            }
        }
    }
}

/// `k: v` pairs of an element joined by `, `. Non-objects use their text.
pub fn flat_summary(element: &Value) -> String {
    match element {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, display_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => display_text(other),
    }
}

/// Values of a flat row: the element's own fields, with the summary
/// written under the subtable field.
pub fn flat_row_values(field: &str, element: &Value) -> Record {
    let mut values = match element {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    values.insert(field.to_string(), Value::String(flat_summary(element)));
    values
}

impl ExpansionState {
    /// Derive the display sequence for the given record indices.
    ///
    /// Each record is followed by its inline details and then its flat
    /// rows, each group in the order the cells were expanded.
    pub fn display_rows<I>(&self, indices: I) -> Vec<DisplayRow>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut rows = Vec::new();
        for index in indices {
            rows.push(DisplayRow::Record { index });

            for entry in Self::row_entries(&self.inline, index) {
                rows.push(DisplayRow::Detail {
                    parent: index,
                    field: entry.key.field.clone(),
                    rows: entry.data.clone(),
                });
            }

            for entry in Self::row_entries(&self.flat, index) {
                for (sub_index, element) in entry.data.iter().enumerate() {
                    rows.push(DisplayRow::Flat {
                        parent: index,
                        field: entry.key.field.clone(),
                        sub_index,
                        values: flat_row_values(&entry.key.field, element),
                    });
                }
            }
        }
        rows
    }
}
