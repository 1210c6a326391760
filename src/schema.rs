//! Column schema inference over heterogeneous records

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::record::Record;

/// Fixed width for subtable columns
pub const SUBTABLE_WIDTH: usize = 120;

const MIN_WIDTH: usize = 80;
const MAX_WIDTH: usize = 300;

/// Record count above which analysis is split across threads
const PARALLEL_THRESHOLD: usize = 10_000;
const PARALLEL_CHUNK: usize = 4_096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
    Subtable,
    Object,
    Unknown,
}

impl ColumnType {
    /// Subtable and object cells are not edited in place
    pub fn is_editable(&self) -> bool {
        !matches!(self, ColumnType::Subtable | ColumnType::Object)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub field: String,
    #[serde(rename = "headerName")]
    pub header_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(rename = "isSubtable")]
    pub is_subtable: bool,
    pub width: usize,
}

/// Value kinds seen for one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KindSet {
    null: bool,
    boolean: bool,
    number: bool,
    string: bool,
    array: bool,
    object: bool,
}

impl KindSet {
    fn observe(&mut self, value: &Value) {
        match value {
            Value::Null => self.null = true,
            Value::Bool(_) => self.boolean = true,
            Value::Number(_) => self.number = true,
            Value::String(_) => self.string = true,
            Value::Array(_) => self.array = true,
            Value::Object(_) => self.object = true,
        }
    }

    fn union(&mut self, other: KindSet) {
        self.null |= other.null;
        self.boolean |= other.boolean;
        self.number |= other.number;
        self.string |= other.string;
        self.array |= other.array;
        self.object |= other.object;
    }

    fn infer(&self) -> ColumnType {
        if self.array {
            return ColumnType::Subtable;
        }
        if self.object {
            return ColumnType::Object;
        }

        let scalars = [
            (self.number, ColumnType::Number),
            (self.boolean, ColumnType::Boolean),
            (self.string, ColumnType::String),
        ];
        let mut present = scalars.iter().filter(|(seen, _)| *seen);

        match (present.next(), present.next()) {
            (None, _) => ColumnType::Unknown,
            // Mixed types degrade to string display
            (Some(_), Some(_)) => ColumnType::String,
            (Some((_, ty)), None) => *ty,
        }
    }
}

/// Incremental analyzer: feed records as they arrive, read columns at any time.
/// Field order is first-seen order across everything observed so far.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    order: Vec<String>,
    kinds: HashMap<String, KindSet>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &Record) {
        for (field, value) in record {
            match self.kinds.get_mut(field) {
                Some(kinds) => kinds.observe(value),
                None => {
                    let mut kinds = KindSet::default();
                    kinds.observe(value);
                    self.order.push(field.clone());
                    self.kinds.insert(field.clone(), kinds);
                }
            }
        }
    }

    /// Observe a batch of records, in parallel for large batches
    pub fn observe_all(&mut self, records: &[Record]) {
        if records.len() < PARALLEL_THRESHOLD {
            for record in records {
                self.observe(record);
            }
            return;
        }

        // `collect` keeps chunk order, so merging preserves first-seen order
        let partials: Vec<SchemaBuilder> = records
            .par_chunks(PARALLEL_CHUNK)
            .map(|chunk| {
                let mut builder = SchemaBuilder::new();
                for record in chunk {
                    builder.observe(record);
                }
                builder
            })
            .collect();

        for partial in partials {
            self.merge(partial);
        }
    }

    /// Fold another builder in, treating its records as observed after ours
    pub fn merge(&mut self, other: SchemaBuilder) {
        let SchemaBuilder { order, mut kinds } = other;
        for field in order {
            let Some(theirs) = kinds.remove(&field) else { continue };
            match self.kinds.get_mut(&field) {
                Some(ours) => ours.union(theirs),
                None => {
                    self.order.push(field.clone());
                    self.kinds.insert(field, theirs);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn columns(&self) -> Vec<ColumnSchema> {
        self.order
            .iter()
            .map(|field| {
                let column_type = self.kinds.get(field).map(KindSet::infer).unwrap_or(ColumnType::Unknown);
                ColumnSchema {
                    field: field.clone(),
                    header_name: field.clone(),
                    column_type,
                    is_subtable: column_type == ColumnType::Subtable,
                    width: estimate_width(field, column_type),
                }
            })
            .collect()
    }
}

/// Infer one column per distinct field name across all records
pub fn analyze(records: &[Record]) -> Vec<ColumnSchema> {
    let mut builder = SchemaBuilder::new();
    builder.observe_all(records);
    builder.columns()
}

/// Header-driven width heuristic: longer names get wider columns, up to a cap
pub fn estimate_width(field: &str, column_type: ColumnType) -> usize {
    if column_type == ColumnType::Subtable {
        return SUBTABLE_WIDTH;
    }
    (field.width() * 12 + 20).clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Field names of all subtable columns, in schema order
pub fn subtable_fields(columns: &[ColumnSchema]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.is_subtable)
        .map(|c| c.field.clone())
        .collect()
}
