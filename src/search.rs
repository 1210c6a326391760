use serde_json::Value;

use crate::expansion::DisplayRow;
use crate::record::{display_text, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Position in the display sequence
    pub display_row: usize,
    pub record_index: usize,
    pub field: String,
}

/// Search state and match navigation
#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<SearchMatch>,
    index: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.index.and_then(|i| self.matches.get(i))
    }

    /// Run a case-insensitive search over record rows. Detail and flat rows
    /// are skipped. Returns the number of matches.
    pub fn search(
        &mut self,
        query: &str,
        display: &[DisplayRow],
        rows: &[Option<Record>],
        fields: &[String],
    ) -> usize {
        self.query = query.trim().to_lowercase();
        self.matches.clear();
        self.index = None;

        if self.query.is_empty() {
            return 0;
        }

        for (display_row, row) in display.iter().enumerate() {
            let Some(index) = row.record_index() else { continue };
            let Some(Some(record)) = rows.get(index) else { continue };

            for field in fields {
                let Some(value) = record.get(field) else { continue };
                if search_text(value).contains(&self.query) {
                    self.matches.push(SearchMatch {
                        display_row,
                        record_index: index,
                        field: field.clone(),
                    });
                }
            }
        }

        if !self.matches.is_empty() {
            self.index = Some(0);
        }
        self.matches.len()
    }

    /// Rerun the current query after the display changed. The current
    /// match stays current while its cell still matches; otherwise the old
    /// position is clamped to the new match count.
    pub fn refresh(
        &mut self,
        display: &[DisplayRow],
        rows: &[Option<Record>],
        fields: &[String],
    ) -> usize {
        let current = self.current().map(|m| (m.record_index, m.field.clone()));
        let previous = self.index;
        let query = self.query.clone();

        let count = self.search(&query, display, rows, fields);
        if count == 0 {
            return 0;
        }
        let kept = current.and_then(|(record_index, field)| {
            self.matches
                .iter()
                .position(|m| m.record_index == record_index && m.field == field)
        });
        self.index = kept.or(previous.map(|i| i.min(count - 1))).or(Some(0));
        count
    }

    pub fn next(&mut self) -> Option<&SearchMatch> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let next = self.index.map_or(0, |i| (i + 1) % count);
        self.index = Some(next);
        self.matches.get(next)
    }

    pub fn prev(&mut self) -> Option<&SearchMatch> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let prev = self.index.map_or(count - 1, |i| (i + count - 1) % count);
        self.index = Some(prev);
        self.matches.get(prev)
    }

    /// Counter text: empty, "No matches", or "i / n"
    pub fn status(&self) -> String {
        if self.query.is_empty() {
            return String::new();
        }
        match self.index {
            Some(i) if !self.matches.is_empty() => format!("{} / {}", i + 1, self.matches.len()),
            _ => "No matches".to_string(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Lowercased text a cell is searched by. Arrays are flattened to the
/// space-joined values of their elements.
pub fn search_text(value: &Value) -> String {
    let text = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => map.values().map(display_text).collect::<Vec<_>>().join(" "),
                other => display_text(other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => display_text(other),
    };
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Option<Record> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn fixture() -> (Vec<DisplayRow>, Vec<Option<Record>>, Vec<String>) {
        let rows = vec![
            record(json!({"name": "Alice", "items": [{"sku": "ABC-1"}, {"sku": "x"}]})),
            record(json!({"name": "Bob", "items": []})),
            record(json!({"name": "alfred", "items": null})),
        ];
        let display = vec![
            DisplayRow::Record { index: 0 },
            DisplayRow::Detail { parent: 0, field: "items".into(), rows: Rc::new(vec![json!({"name": "al"})]) },
            DisplayRow::Record { index: 1 },
            DisplayRow::Record { index: 2 },
        ];
        (display, rows, vec!["name".to_string(), "items".to_string()])
    }

    #[test]
    fn test_search_skips_synthetic_rows() {
        let (display, rows, fields) = fixture();
        let mut search = SearchState::new();
        assert_eq!(search.search("  AL ", &display, &rows, &fields), 2);
        assert_eq!(search.matches()[0], SearchMatch { display_row: 0, record_index: 0, field: "name".into() });
        assert_eq!(search.matches()[1].display_row, 3);
        assert_eq!(search.status(), "1 / 2");
    }

    #[test]
    fn test_search_inside_arrays() {
        let (display, rows, fields) = fixture();
        let mut search = SearchState::new();
        assert_eq!(search.search("abc", &display, &rows, &fields), 1);
        assert_eq!(search.current().unwrap().field, "items");
    }

    #[test]
    fn test_navigation_wraps() {
        let (display, rows, fields) = fixture();
        let mut search = SearchState::new();
        search.search("al", &display, &rows, &fields);

        assert_eq!(search.next().unwrap().display_row, 3);
        assert_eq!(search.next().unwrap().display_row, 0);
        assert_eq!(search.prev().unwrap().display_row, 3);
        assert_eq!(search.status(), "2 / 2");
    }

    #[test]
    fn test_refresh_keeps_current_match() {
        let (mut display, mut rows, fields) = fixture();
        let mut search = SearchState::new();
        search.search("al", &display, &rows, &fields);
        assert_eq!(search.next().unwrap().record_index, 2);

        // Detail row gone: the match moves up but stays current
        display.remove(1);
        assert_eq!(search.refresh(&display, &rows, &fields), 2);
        assert_eq!(search.current().unwrap().display_row, 2);
        assert_eq!(search.status(), "2 / 2");

        // Current cell no longer matches: position is clamped
        rows[2] = record(json!({"name": "zed"}));
        assert_eq!(search.refresh(&display, &rows, &fields), 1);
        assert_eq!(search.status(), "1 / 1");
    }

    #[test]
    fn test_status_text() {
        let (display, rows, fields) = fixture();
        let mut search = SearchState::new();
        assert_eq!(search.status(), "");
        search.search("zzz", &display, &rows, &fields);
        assert_eq!(search.status(), "No matches");
        assert!(search.next().is_none());
        search.search("", &display, &rows, &fields);
        assert_eq!(search.status(), "");
    }

    #[test]
    fn test_search_text_flattening() {
        assert_eq!(search_text(&json!([{"a": "X", "b": null}, 3])), "x  3");
        assert_eq!(search_text(&json!(null)), "");
        assert_eq!(search_text(&json!({"k": 1})), "{\"k\":1}");
    }
}
