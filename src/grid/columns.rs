use std::collections::{HashMap, HashSet};

use crate::schema::ColumnSchema;

/// Column visibility and current widths
#[derive(Debug, Default)]
pub struct ColumnView {
    fields: Vec<String>,
    subtable_fields: Vec<String>,
    hidden: HashSet<String>,
    widths: HashMap<String, usize>,
    schema_widths: HashMap<String, usize>,
}

impl ColumnView {
    /// Take a fresh column set. Hidden fields that still exist stay hidden.
    pub fn reset(&mut self, columns: &[ColumnSchema], subtable_width: usize) {
        self.fields = columns.iter().map(|c| c.field.clone()).collect();
        self.subtable_fields = columns
            .iter()
            .filter(|c| c.is_subtable)
            .map(|c| c.field.clone())
            .collect();

        let fields: HashSet<&String> = self.fields.iter().collect();
        self.hidden.retain(|f| fields.contains(f));

        self.schema_widths = columns
            .iter()
            .map(|c| {
                let width = if c.is_subtable { subtable_width } else { c.width };
                (c.field.clone(), width)
            })
            .collect();
        self.widths = self.schema_widths.clone();
    }

    pub fn all_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn subtable_fields(&self) -> &[String] {
        &self.subtable_fields
    }

    pub fn visible_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| !self.hidden.contains(*f))
            .cloned()
            .collect()
    }

    pub fn is_visible(&self, field: &str) -> bool {
        !self.hidden.contains(field)
    }

    pub fn set_visible(&mut self, field: &str, visible: bool) {
        if visible {
            self.hidden.remove(field);
        } else {
            self.hidden.insert(field.to_string());
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hide_all(&mut self) {
        self.hidden.extend(self.fields.iter().cloned());
    }

    pub fn visible_count(&self) -> usize {
        self.fields.iter().filter(|f| !self.hidden.contains(*f)).count()
    }

    pub fn width(&self, field: &str) -> Option<usize> {
        self.widths.get(field).copied()
    }

    pub fn widen_subtables(&mut self, width: usize) {
        for field in &self.subtable_fields {
            self.widths.insert(field.clone(), width);
        }
    }

    pub fn restore_widths(&mut self) {
        self.widths = self.schema_widths.clone();
    }
}
