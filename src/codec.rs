//! Line-oriented JSON codec
//!
//! Parsing never aborts: every bad line becomes a [`ParseError`] and the
//! remaining lines are still read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::record::Record;

const BOM: char = '\u{feff}';

/// A line that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// The original line text, untrimmed
    pub raw: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub records: Vec<Record>,
    pub errors: Vec<ParseError>,
}

pub fn parse(text: &str) -> ParseResult {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut result = ParseResult::default();

    // `lines` splits on `\n` and drops a trailing `\r`
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let message = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(record)) => {
                result.records.push(record);
                continue;
            }
            Ok(_) => "Line is not a JSON object".to_string(),
            Err(e) => e.to_string(),
        };

        result.errors.push(ParseError {
            line: i + 1,
            raw: raw.to_string(),
            message,
        });
    }

    result
}

/// Decode file content (UTF-8, invalid sequences replaced) and parse it
pub fn parse_bytes(bytes: &[u8]) -> ParseResult {
    parse(&String::from_utf8_lossy(bytes))
}

/// One compact JSON object per line, always newline-terminated.
/// An empty record list serializes to a single `"\n"`.
pub fn serialize(records: &[Record]) -> Result<String> {
    let mut lines = Vec::with_capacity(records.len());
    for record in records {
        lines.push(serde_json::to_string(record)?);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

pub fn serialize_to_bytes(records: &[Record]) -> Result<Vec<u8>> {
    serialize(records).map(String::into_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let result = parse("{\"id\":1,\"name\":\"Alice\"}\n{\"id\":2,\"name\":\"Bob\"}\n");
        assert_eq!(result.records.len(), 2);
        assert!(result.errors.is_empty());
        assert_eq!(result.records[1], obj(json!({"id": 2, "name": "Bob"})));
    }

    #[test]
    fn test_parse_errors_do_not_abort() {
        let result = parse("{\"a\":1}\nnot valid json\n{\"a\":3}\n\n{\"a\":4}\n");
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 2);
        assert_eq!(result.errors[0].raw, "not valid json");
        assert!(!result.errors[0].message.is_empty());
    }

    #[test]
    fn test_whitespace_lines_skipped() {
        let result = parse("   \n\t\n{\"a\":1}\n  \r\n");
        assert_eq!(result.records.len(), 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let result = parse("");
        assert!(result.records.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_bom_stripped() {
        let result = parse("\u{feff}{\"id\":1,\"name\":\"BOM test\"}\n{\"id\":2}\n");
        assert_eq!(result.records.len(), 2);
        assert!(result.errors.is_empty());
        assert_eq!(result.records[0]["name"], json!("BOM test"));
    }

    #[test]
    fn test_crlf_lines() {
        let result = parse("{\"a\":1}\r\n{\"a\":2}\r\nbad\r\n");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 3);
        assert_eq!(result.errors[0].raw, "bad");
    }

    #[test]
    fn test_non_object_values_rejected() {
        let result = parse("\"just a string\"\n42\n[1,2,3]\nnull");
        assert!(result.records.is_empty());
        assert_eq!(result.errors.len(), 4);
        let lines: Vec<usize> = result.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert_eq!(result.errors[2].message, "Line is not a JSON object");
    }

    #[test]
    fn test_error_keeps_untrimmed_raw() {
        let result = parse("  [1]  \n");
        assert_eq!(result.errors[0].raw, "  [1]  ");
    }

    #[test]
    fn test_subtables_parsed() {
        let result = parse(r#"{"id":"001","subtable_items":[{"item":"A","qty":1},{"item":"B","qty":2}]}"#);
        assert_eq!(
            result.records[0]["subtable_items"],
            json!([{"item": "A", "qty": 1}, {"item": "B", "qty": 2}])
        );
    }

    #[test]
    fn test_field_order_preserved() {
        let result = parse(r#"{"z":1,"a":2,"m":3}"#);
        let keys: Vec<&String> = result.records[0].keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_bytes_lossy() {
        let mut bytes = b"{\"a\":1}\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let result = parse_bytes(&bytes);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 2);
    }

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize(&[]).unwrap(), "\n");
    }

    #[test]
    fn test_serialize_compact_lines() {
        let records = vec![
            obj(json!({"id": 1, "tags": [{"t": "x"}]})),
            obj(json!({"id": 2, "name": "line\nbreak"})),
        ];
        let text = serialize(&records).unwrap();
        assert_eq!(
            text,
            "{\"id\":1,\"tags\":[{\"t\":\"x\"}]}\n{\"id\":2,\"name\":\"line\\nbreak\"}\n"
        );
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_roundtrip() {
        let records = vec![
            obj(json!({"a": 1, "b": null, "c": true, "d": "s", "e": {"k": [1, 2]}})),
            obj(json!({"sub": [{"q": 1.5}, {"q": -2}]})),
            obj(json!({})),
        ];
        let result = parse(&serialize(&records).unwrap());
        assert!(result.errors.is_empty());
        assert_eq!(result.records, records);
    }

    #[test]
    fn test_floats_read_back_exactly() {
        let values = [1.0715660391465826e-75, 0.1 + 0.2, 2.2250738585072014e-308, 1.7976931348623157e308];
        let records: Vec<Record> = values.iter().map(|v| obj(json!({ "v": v }))).collect();
        let text = serialize(&records).unwrap();
        let result = parse(&text);
        assert_eq!(result.records, records);
        assert_eq!(serialize(&result.records).unwrap(), text);
    }

    #[test]
    fn test_serialize_never_emits_bom() {
        let result = parse("\u{feff}{\"a\":1}\n");
        let bytes = serialize_to_bytes(&result.records).unwrap();
        assert_eq!(bytes, b"{\"a\":1}\n");
    }
}
