// Normalization of HestiaCP command replies.
//
// The command API answers in one of several shapes depending on the command and on
// `returncode=yes`: a bare integer, a JSON document, a whitespace-aligned table with a
// dashed separator under the header, or free text. Parsing tries each shape in that
// order and returns a tagged variant.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::HestiaError;

/// One row of a tabular reply, keyed by upper-cased column header
pub type TableRow = Map<String, Value>;

/// A parsed listing with its header order preserved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Rows dropped because they had fewer cells than the header
    pub skipped: usize,
}

/// Tagged reply shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    ReturnCode(i32),
    Json(Value),
    Table(Table),
    Text(String),
    Empty,
}

impl Reply {
    /// Parse a raw body into the first shape that fits
    pub fn parse(body: &str) -> Reply {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Reply::Empty;
        }

        if let Ok(code) = trimmed.parse::<i32>() {
            return Reply::ReturnCode(code);
        }

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return Reply::Json(value);
            }
        }

        if let Some(table) = parse_table(trimmed) {
            return Reply::Table(table);
        }

        Reply::Text(trimmed.to_string())
    }

    /// Split the parsed body into success data or a remote failure
    pub fn into_result(self) -> Result<Reply, HestiaError> {
        match self {
            Reply::ReturnCode(0) => Ok(Reply::ReturnCode(0)),
            Reply::ReturnCode(code) => Err(HestiaError::remote(code)),
            Reply::Text(text) if is_error_text(&text) => Err(HestiaError::Remote {
                code: None,
                message: text.trim_start_matches("Error:").trim().to_string(),
            }),
            other => Ok(other),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Payload as JSON, for the uniform `data` field
    pub fn to_data(&self) -> Option<Value> {
        match self {
            Reply::ReturnCode(_) | Reply::Empty => None,
            Reply::Json(value) => Some(value.clone()),
            Reply::Table(table) => Some(Value::Array(
                table.rows.iter().cloned().map(Value::Object).collect(),
            )),
            Reply::Text(text) => Some(Value::String(text.clone())),
        }
    }
}

fn is_error_text(text: &str) -> bool {
    text.starts_with("Error:") || text.starts_with("Error ")
}

/// Parse `HEADER HEADER\n----- -----\nrow row` listings.
///
/// Returns `None` when the second non-empty line is not a dash separator. Rows with
/// fewer cells than headers are counted in `skipped`. The last column absorbs any
/// surplus cells so values containing spaces survive.
pub fn parse_table(body: &str) -> Option<Table> {
    let mut lines = body.lines().map(str::trim_end).filter(|l| !l.trim().is_empty());

    let header = lines.next()?;
    let separator = lines.next()?;
    if !is_separator(separator) {
        return None;
    }

    let columns: Vec<String> = header.split_whitespace().map(|c| c.to_uppercase()).collect();
    if columns.is_empty() {
        return None;
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    for line in lines {
        let cells: Vec<&str> = line.split_whitespace().collect();
        if cells.len() < columns.len() {
            skipped += 1;
            continue;
        }

        let mut row = Map::new();
        let last = columns.len() - 1;
        for (i, column) in columns.iter().enumerate() {
            let value = if i == last {
                cells[i..].join(" ")
            } else {
                cells[i].to_string()
            };
            row.insert(column.clone(), Value::String(value));
        }
        rows.push(row);
    }

    Some(Table { columns, rows, skipped })
}

fn is_separator(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.chars().all(|c| c == '-' || c.is_whitespace()) && t.contains("---")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_integer_is_return_code() {
        assert_eq!(Reply::parse("0\n"), Reply::ReturnCode(0));
        assert_eq!(Reply::parse(" 4 "), Reply::ReturnCode(4));
    }

    #[test]
    fn nonzero_code_becomes_remote_error() {
        let err = Reply::parse("3").into_result().unwrap_err();
        assert_eq!(err.return_code(), Some(3));
        assert!(err.is_not_found());
    }

    #[test]
    fn json_body_is_data() {
        let reply = Reply::parse(r#"{"alice":{"PACKAGE":"starter"}}"#);
        assert_eq!(reply.as_json().unwrap()["alice"]["PACKAGE"], json!("starter"));
        assert!(reply.into_result().is_ok());
    }

    #[test]
    fn malformed_json_falls_through_to_text() {
        let reply = Reply::parse("{not json");
        assert_eq!(reply, Reply::Text("{not json".into()));
    }

    #[test]
    fn table_with_short_rows_skips_them() {
        let body = "PKG      WEB  DB  DISK   BW      DATE\n\
                    ---      ---  --  ----   --      ----\n\
                    starter  1    1   5120   51200   2024-01-01\n\
                    broken   1\n\
                    business 5    5   20480  204800  2024-01-01\n";
        let table = parse_table(body).unwrap();
        assert_eq!(table.columns, vec!["PKG", "WEB", "DB", "DISK", "BW", "DATE"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.skipped, 1);
        assert_eq!(table.rows[1]["DISK"], json!("20480"));
    }

    #[test]
    fn text_without_separator_is_not_a_table() {
        assert!(parse_table("hello\nworld").is_none());
        assert_eq!(Reply::parse("hello\nworld"), Reply::Text("hello\nworld".into()));
    }

    #[test]
    fn error_text_is_a_remote_failure() {
        let err = Reply::parse("Error: user alice doesn't exist").into_result().unwrap_err();
        assert_eq!(err.return_code(), None);
        assert!(err.to_string().contains("user alice doesn't exist"));
    }

    #[test]
    fn table_rows_become_json_data() {
        let reply = Reply::parse("A  B\n-  ---\nx  y z");
        let data = reply.to_data().unwrap();
        assert_eq!(data, json!([{ "A": "x", "B": "y z" }]));
    }
}
