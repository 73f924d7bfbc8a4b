// Parser for delimited logs carrying an embedded JSON payload per row
use super::timestamp::parse_timestamp;
use super::{ArchiveError, ParsedLog, coerce_numeric};
use crate::domain::record_set::RecordSetBuilder;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

const TIMESTAMP_FIELD: &str = "timestamp";
const PAYLOAD_FIELD: &str = "parsed_json";

pub fn parse_json_log(path: &Path) -> Result<ParsedLog, ArchiveError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(ts_idx), Some(payload_idx)) = (position(TIMESTAMP_FIELD), position(PAYLOAD_FIELD))
    else {
        return Err(ArchiveError::MissingColumns(format!(
            "{TIMESTAMP_FIELD}, {PAYLOAD_FIELD}"
        )));
    };

    let mut builder = RecordSetBuilder::new();
    let mut skipped_rows = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let Some(timestamp) = record.get(ts_idx).and_then(parse_timestamp) else {
            skipped_rows += 1;
            continue;
        };

        let payload = record.get(payload_idx).unwrap_or_default();
        match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(map)) => {
                let mut cells = Vec::new();
                flatten_into(&mut cells, None, &map);
                builder.push_row(timestamp, cells);
            }
            Ok(_) => {
                debug!(row = line + 1, "payload is not an object");
                skipped_rows += 1;
            }
            Err(err) => {
                debug!(row = line + 1, error = %err, "undecodable payload");
                skipped_rows += 1;
            }
        }
    }

    ParsedLog::finish(builder, 0, skipped_rows)
}

/// Nested objects become dotted column names (`wind.speed`).
fn flatten_into(cells: &mut Vec<(String, Option<f64>)>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_into(cells, Some(&name), inner),
            Value::Number(number) => cells.push((name, number.as_f64().filter(|v| v.is_finite()))),
            Value::String(text) => cells.push((name, coerce_numeric(text))),
            Value::Null | Value::Bool(_) | Value::Array(_) => cells.push((name, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_log(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_flattens_payload() {
        let (_dir, path) = write_log(
            "timestamp,raw_line,parsed_json\n\
             2024-01-01 10:00:00,S 1.5,\"{\"\"S\"\": 1.5, \"\"D\"\": \"\"90\"\", \"\"status\"\": \"\"ok\"\"}\"\n\
             2024-01-01 10:00:01,garbage,\"{not json\"\n\
             2024-01-01 10:00:02,S 2.5,\"{\"\"S\"\": 2.5, \"\"imu\"\": {\"\"pitch\"\": -1.25}}\"\n",
        );

        let parsed = parse_json_log(&path).unwrap();
        let records = &parsed.records;

        assert_eq!(records.len(), 2);
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(records.columns(), ["S", "D", "status", "imu.pitch"]);
        assert_eq!(records.value(0, "D"), Some(90.0));
        assert_eq!(records.value(0, "status"), None);
        assert_eq!(records.value(1, "imu.pitch"), Some(-1.25));
        assert_eq!(records.value(1, "D"), None);
    }

    #[test]
    fn test_missing_payload_column() {
        let (_dir, path) = write_log("timestamp,raw_line\n2024-01-01 10:00:00,S 1\n");
        assert!(matches!(parse_json_log(&path), Err(ArchiveError::MissingColumns(_))));
    }

    #[test]
    fn test_no_usable_rows() {
        let (_dir, path) = write_log("timestamp,parsed_json\n2024-01-01 10:00:00,oops\nnever,{}\n");
        assert!(matches!(parse_json_log(&path), Err(ArchiveError::NoUsableRows)));
    }
}
