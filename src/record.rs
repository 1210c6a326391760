use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GridError, Result};

/// One JSON object, one line of the source file. Field order is preserved.
pub type Record = Map<String, Value>;

/// An editable location inside a record.
///
/// On the wire a path is a plain string: a top-level field name, or the
/// composite form `field[index].sub_field` addressing one key inside the
/// `index`-th element of an array field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldPath {
    Field(String),
    Nested {
        field: String,
        index: usize,
        sub_field: String,
    },
}

fn nested_path_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)\[(\d+)\]\.(.+)$").ok()).as_ref()
}

impl FieldPath {
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath::Field(name.into())
    }

    pub fn nested(field: impl Into<String>, index: usize, sub_field: impl Into<String>) -> Self {
        FieldPath::Nested {
            field: field.into(),
            index,
            sub_field: sub_field.into(),
        }
    }

    /// Parse the wire form. Anything that is not a well-formed composite path
    /// is taken as a top-level field name.
    pub fn parse(s: &str) -> Self {
        Self::parse_nested(s).unwrap_or_else(|| FieldPath::Field(s.to_string()))
    }

    fn parse_nested(s: &str) -> Option<Self> {
        let caps = nested_path_regex()?.captures(s)?;
        let field = caps.get(1)?.as_str();
        let index = caps.get(2)?.as_str().parse::<usize>().ok()?;
        let sub_field = caps.get(3)?.as_str();
        Some(FieldPath::nested(field, index, sub_field))
    }

    /// The top-level field this path lives under
    pub fn top_field(&self) -> &str {
        match self {
            FieldPath::Field(name) => name,
            FieldPath::Nested { field, .. } => field,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldPath::Nested { .. })
    }

    pub fn get<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        match self {
            FieldPath::Field(name) => record.get(name),
            FieldPath::Nested { field, index, sub_field } => record
                .get(field)?
                .as_array()?
                .get(*index)?
                .as_object()?
                .get(sub_field),
        }
    }

    /// Write `value` at this path, removing the key when `value` is `None`.
    /// Returns the value previously stored there (`None` if the key was absent).
    pub fn write(&self, record: &mut Record, value: Option<Value>) -> Result<Option<Value>> {
        let target = match self {
            FieldPath::Field(_) => Some(record),
            FieldPath::Nested { field, index, .. } => record
                .get_mut(field)
                .and_then(Value::as_array_mut)
                .and_then(|items| items.get_mut(*index))
                .and_then(Value::as_object_mut),
        };
        let target = target.ok_or_else(|| GridError::PathNotFound(self.clone()))?;

        let key = match self {
            FieldPath::Field(name) => name,
            FieldPath::Nested { sub_field, .. } => sub_field,
        };

        Ok(match value {
            Some(value) => target.insert(key.clone(), value),
            None => target.shift_remove(key),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Field(name) => write!(f, "{}", name),
            FieldPath::Nested { field, index, sub_field } => {
                write!(f, "{}[{}].{}", field, index, sub_field)
            }
        }
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::parse(&s)
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// A single cell edit, the atomic undoable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellEdit {
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    pub field: FieldPath,
    #[serde(rename = "oldValue", default)]
    pub old_value: Value,
    #[serde(rename = "newValue", default)]
    pub new_value: Value,
}

impl CellEdit {
    pub fn new(row_index: usize, field: FieldPath, old_value: Value, new_value: Value) -> Self {
        Self { row_index, field, old_value, new_value }
    }
}

/// Text shown for a value in a cell or summary
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
