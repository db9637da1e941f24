//! Row output as JSON or CSV

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Write rows to `out`
///
/// JSON keeps nested values. CSV flattens each row: nested objects (the group
/// key) become top-level columns and lists are joined with `;`.
pub fn write_rows<T: Serialize, W: Write>(rows: &[T], format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, rows).context("Failed to encode JSON output")?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let flat = rows
                .iter()
                .map(|row| serde_json::to_value(row).map(flatten))
                .collect::<serde_json::Result<Vec<_>>>()
                .context("Failed to encode rows")?;
            write_csv(&flat, out)?;
        }
    }
    Ok(())
}

/// Write a single record; a one-row table in CSV
pub fn write_record<T: Serialize, W: Write>(record: &T, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, record).context("Failed to encode JSON output")?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Csv => write_rows(std::slice::from_ref(record), format, out),
    }
}

fn flatten(value: Value) -> Map<String, Value> {
    let mut flat = Map::new();
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                match field {
                    Value::Object(nested) => {
                        for (nested_key, nested_value) in nested {
                            flat.insert(nested_key, Value::String(cell(nested_value)));
                        }
                    }
                    other => {
                        flat.insert(key, Value::String(cell(other)));
                    }
                }
            }
        }
        other => {
            flat.insert("value".to_string(), Value::String(cell(other)));
        }
    }
    flat
}

fn cell(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items.into_iter().map(cell).collect::<Vec<_>>().join(";"),
        Value::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}

fn write_csv<W: Write>(rows: &[Map<String, Value>], out: W) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };

    let header: Vec<&String> = first.keys().collect();
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&header)?;
    for row in rows {
        let record: Vec<&str> = header
            .iter()
            .map(|key| row.get(key.as_str()).and_then(Value::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn csv_of(value: Value) -> String {
        let mut out = Vec::new();
        write_rows(&[value], OutputFormat::Csv, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_group_key_flattened_and_lists_joined() {
        let row = json!({
            "group": {"supervisor_group": "S1", "job_code": "J1"},
            "bundle_roles": ["R1", "R2"],
            "users_covered": 8,
        });

        assert_eq!(
            csv_of(row),
            "supervisor_group,job_code,bundle_roles,users_covered\nS1,J1,R1;R2,8\n"
        );
    }

    #[test]
    fn test_null_is_blank() {
        assert_eq!(csv_of(json!({"a": null, "b": true})), "a,b\n,true\n");
    }

    #[test]
    fn test_nested_objects_in_lists_stay_json() {
        let out = csv_of(json!({"conflicts": [{"severity": "HIGH"}]}));
        assert!(out.contains("HIGH"));
    }

    #[test]
    fn test_empty_rows_write_nothing() {
        let mut out = Vec::new();
        write_rows::<Value, _>(&[], OutputFormat::Csv, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_rows() {
        let mut out = Vec::new();
        write_rows(&[json!({"a": 1})], OutputFormat::Json, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!([{"a": 1}]));
    }
}
