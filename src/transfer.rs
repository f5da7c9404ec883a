//! JSON / CSV export and JSON import of counters.
//!
//! Exports always carry the expanded display name, so a counter that was
//! never renamed is written as "Counter #<id>". Imports only need `name` and
//! `value`; ids are reassigned by the database when the entries are added.

use crate::model::{CounterRecord, DEFAULT_COUNTER_NAME};
use crate::storage::FileStore;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: i64,
    name: &'a str,
    value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportEntry {
    pub name: String,
    pub value: i64,
}

pub fn export_json(counters: &[CounterRecord]) -> Result<String> {
    let names: Vec<String> = counters.iter().map(|c| c.display_name()).collect();
    let rows: Vec<ExportRow> = counters
        .iter()
        .zip(&names)
        .map(|(c, name)| ExportRow {
            id: c.id,
            name,
            value: c.value,
        })
        .collect();
    serde_json::to_string(&rows).context("Failed to encode counters as JSON")
}

pub fn export_csv(counters: &[CounterRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for c in counters {
        let name = c.display_name();
        writer
            .serialize(ExportRow {
                id: c.id,
                name: &name,
                value: c.value,
            })
            .context("Failed to encode counter as CSV")?;
    }
    // An empty export still gets its header row.
    if counters.is_empty() {
        writer.write_record(["id", "name", "value"])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

pub fn export(format: ExportFormat, counters: &[CounterRecord]) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(counters),
        ExportFormat::Csv => export_csv(counters),
    }
}

/// Parses a JSON array of `{name, value}` objects. Any malformed entry fails
/// the whole parse.
pub fn parse_json(text: &str) -> Result<Vec<ImportEntry>> {
    serde_json::from_str::<Vec<ImportEntry>>(text).context("Invalid counter import file")
}

/// Drops entries that already exist with the same name and value.
///
/// Names are compared the way they are stored: trimmed, and a blank name or
/// the bare placeholder matches any counter that still has the placeholder.
pub fn select_new_entries(existing: &[CounterRecord], entries: Vec<ImportEntry>) -> Vec<ImportEntry> {
    entries
        .into_iter()
        .filter(|e| !existing.iter().any(|c| is_same_counter(c, e)))
        .collect()
}

fn is_same_counter(counter: &CounterRecord, entry: &ImportEntry) -> bool {
    if counter.value != entry.value {
        return false;
    }
    let name = entry.name.trim();
    if name.is_empty() || name == DEFAULT_COUNTER_NAME {
        return counter.has_default_name();
    }
    counter.display_name() == name
}

/// Suggested file name, e.g. `counters_export_2024_03_7.json`.
pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "counters_export_{}_{:02}_{}.{}",
        date.year(),
        date.month(),
        date.day(),
        format.extension()
    )
}

pub fn export_to_path(path: &Path, format: ExportFormat, counters: &[CounterRecord]) -> Result<()> {
    let contents = export(format, counters)?;
    FileStore::atomic_write(path, contents)
        .with_context(|| format!("Failed to export counters to {:?}", path))
}

pub fn import_from_path(path: &Path) -> Result<Vec<ImportEntry>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    parse_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CounterRecord> {
        vec![
            CounterRecord::new(1, DEFAULT_COUNTER_NAME, 5),
            CounterRecord::new(2, "Score, total", 10),
        ]
    }

    #[test]
    fn test_export_json_expands_placeholder_names() {
        let json = export_json(&sample()).unwrap();
        assert_eq!(
            json,
            r#"[{"id":1,"name":"Counter #1","value":5},{"id":2,"name":"Score, total","value":10}]"#
        );
    }

    #[test]
    fn test_export_csv_has_header_and_quotes() {
        let csv = export_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,name,value");
        assert_eq!(lines[1], "1,Counter #1,5");
        assert_eq!(lines[2], "2,\"Score, total\",10");

        let empty = export_csv(&[]).unwrap();
        assert_eq!(empty.trim(), "id,name,value");
    }

    #[test]
    fn test_parse_ignores_extra_fields_and_missing_id() {
        let entries =
            parse_json(r#"[{"id": 9, "name": "A", "value": -3, "color": "red"}, {"name": "B", "value": 7}]"#)
                .unwrap();
        assert_eq!(
            entries,
            vec![
                ImportEntry {
                    name: "A".into(),
                    value: -3
                },
                ImportEntry {
                    name: "B".into(),
                    value: 7
                },
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(parse_json("not json").is_err());
        assert!(parse_json(r#"[{"name": "A"}]"#).is_err());
        assert!(parse_json(r#"[{"name": "A", "value": 1}, {"value": 2}]"#).is_err());
        assert!(parse_json(r#"{"name": "A", "value": 1}"#).is_err());
    }

    #[test]
    fn test_export_then_select_finds_nothing_new() {
        let counters = sample();
        let entries = parse_json(&export_json(&counters).unwrap()).unwrap();
        assert!(select_new_entries(&counters, entries).is_empty());
    }

    #[test]
    fn test_select_keeps_same_name_with_different_value() {
        let counters = sample();
        let entries = vec![
            ImportEntry {
                name: "Counter #1".into(),
                value: 6,
            },
            ImportEntry {
                name: "Counter #1".into(),
                value: 5,
            },
            ImportEntry {
                name: "Fresh".into(),
                value: 0,
            },
        ];
        let selected = select_new_entries(&counters, entries);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].value, 6);
        assert_eq!(selected[1].name, "Fresh");
    }

    #[test]
    fn test_select_normalizes_names_like_add() {
        let counters = vec![
            CounterRecord::new(4, "Score", 3),
            CounterRecord::new(5, DEFAULT_COUNTER_NAME, 0),
        ];
        let entries = parse_json(
            r#"[{"name":"Score ","value":3},{"name":"","value":0},{"name":"Counter #","value":0},{"name":"  ","value":1}]"#,
        )
        .unwrap();
        let selected = select_new_entries(&counters, entries);
        assert_eq!(
            selected,
            vec![ImportEntry {
                name: "  ".into(),
                value: 1
            }]
        );
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Json, date),
            "counters_export_2024_03_7.json"
        );
        assert_eq!(
            export_file_name(ExportFormat::Csv, date),
            "counters_export_2024_03_7.csv"
        );
    }

    #[test]
    fn test_export_to_path_and_import_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.json");
        export_to_path(&path, ExportFormat::Json, &sample()).unwrap();

        let entries = import_from_path(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Counter #1");

        assert!(import_from_path(&dir.path().join("missing.json")).is_err());
    }
}
