//! CSV export of readings
//!
//! One header row and one row per reading. `timestamp` is always the first
//! column, the remaining fields follow in name order. Values containing a
//! comma, quote or line break are quoted (RFC 4180); lines end with CRLF.

use serde_json::Value;

use crate::shared::Reading;

/// Column names for `readings`: `timestamp`, then every field name once
pub fn columns<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Vec<String> {
    let mut names: Vec<String> = readings
        .into_iter()
        .flat_map(|r| r.fields.keys().cloned())
        .collect();
    names.sort();
    names.dedup();
    std::iter::once("timestamp".to_string()).chain(names).collect()
}

/// Render readings as a CSV document
pub fn to_csv(readings: &[Reading]) -> String {
    let columns = columns(readings);
    let mut out = String::new();
    push_row(&mut out, columns.iter().map(|c| escape(c)));

    for reading in readings {
        let cells = columns.iter().map(|column| {
            if column == "timestamp" {
                cell(reading.raw_timestamp())
            } else {
                reading.field(column).map(cell).unwrap_or_default()
            }
        });
        push_row(&mut out, cells);
    }
    out
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let row: Vec<String> = cells.collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

fn escape(raw: &str) -> String {
    if raw.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
