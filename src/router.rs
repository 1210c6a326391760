//! Maps renderer cell edits back to document edits
//!
//! The renderer addresses a main-grid cell by its display position, which
//! drifts from the record index once detail or flat rows are inserted. The
//! display row itself carries the record index, so routing never needs a
//! sentinel on the record.

use serde_json::{Number, Value};
use tracing::debug;

use crate::expansion::DisplayRow;
use crate::record::{CellEdit, FieldPath, Record};
use crate::schema::{ColumnSchema, ColumnType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOrigin {
    /// Main grid cell at a display position
    Grid { display_row: usize },
    /// Cell of a nested grid (inline detail, modal, or docked panel)
    Subtable {
        parent: usize,
        field: String,
        sub_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellEditEvent {
    pub origin: EditOrigin,
    /// Column the edited cell belongs to
    pub column: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Turn a renderer edit into a document edit, or `None` when the cell is
/// not editable at that position.
pub fn route(event: CellEditEvent, display: &[DisplayRow], columns: &[ColumnSchema]) -> Option<CellEdit> {
    let CellEditEvent { origin, column, old_value, new_value } = event;

    let (row_index, path) = match origin {
        EditOrigin::Subtable { parent, field, sub_index } => {
            (parent, FieldPath::nested(field, sub_index, column))
        }
        EditOrigin::Grid { display_row } => match display.get(display_row)? {
            DisplayRow::Record { index } => {
                let column_type = column_type(columns, &column);
                if !column_type.is_editable() {
                    debug!(%column, ?column_type, "edit on read-only column ignored");
                    return None;
                }
                let new_value = coerce_value(column_type, new_value);
                return Some(CellEdit::new(*index, FieldPath::field(column), old_value, new_value));
            }
            DisplayRow::Flat { parent, field, sub_index, values } => {
                let Some(cell_type) =
                    flat_cell_type(field, values, &column).filter(ColumnType::is_editable)
                else {
                    debug!(%field, %column, "edit on flat row cell ignored");
                    return None;
                };
                let new_value = coerce_value(cell_type, new_value);
                let path = FieldPath::nested(field.clone(), *sub_index, column);
                return Some(CellEdit::new(*parent, path, old_value, new_value));
            }
            DisplayRow::Detail { parent, field, .. } => {
                debug!(parent, %field, "edit on detail row ignored");
                return None;
            }
        },
    };

    Some(CellEdit::new(row_index, path, old_value, new_value))
}

fn column_type(columns: &[ColumnSchema], field: &str) -> ColumnType {
    columns
        .iter()
        .find(|c| c.field == field)
        .map(|c| c.column_type)
        .unwrap_or(ColumnType::Unknown)
}

/// Type of a flat-row cell judged by the element's own value. `None` for
/// the summary cell and for columns the element does not have.
pub fn flat_cell_type(field: &str, values: &Record, column: &str) -> Option<ColumnType> {
    if field == column {
        return None;
    }
    let cell_type = match values.get(column)? {
        Value::Number(_) => ColumnType::Number,
        Value::Bool(_) => ColumnType::Boolean,
        Value::String(_) => ColumnType::String,
        Value::Array(_) => ColumnType::Subtable,
        Value::Object(_) => ColumnType::Object,
        Value::Null => ColumnType::Unknown,
    };
    Some(cell_type)
}

/// Number columns turn edited text into a number when it parses;
/// anything else is kept as entered.
pub fn coerce_value(column_type: ColumnType, value: Value) -> Value {
    if column_type != ColumnType::Number {
        return value;
    }
    let Value::String(text) = &value else {
        return value;
    };
    parse_number(text).map(Value::Number).unwrap_or(value)
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Number::from(n));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}
