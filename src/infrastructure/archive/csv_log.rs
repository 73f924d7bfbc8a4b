// Parser for the delimited data logs written by the live logger
use super::timestamp::parse_timestamp;
use super::{ArchiveError, ParsedLog, coerce_numeric};
use crate::domain::reading::SENSOR_ERROR_SENTINEL;
use crate::domain::record_set::RecordSetBuilder;
use std::path::Path;

const TIMESTAMP_HEADERS: [&str; 3] = ["Time", "timestamp", "Timestamp"];
/// Wind-speed columns where the device writes its error sentinel.
const SENTINEL_COLUMNS: [&str; 3] = ["S", "S2", "S3"];

pub fn parse_csv_log(path: &Path) -> Result<ParsedLog, ArchiveError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let ts_idx = TIMESTAMP_HEADERS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .ok_or(ArchiveError::MissingTimestampColumn)?;

    let value_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != ts_idx)
        .collect();

    let mut builder = RecordSetBuilder::with_columns(value_columns.iter().map(|(_, name)| *name));
    let mut sentinel_rewrites = 0usize;
    let mut skipped_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        let Some(timestamp) = record.get(ts_idx).and_then(parse_timestamp) else {
            skipped_rows += 1;
            continue;
        };

        // Cells past the header width are dropped.
        let cells = value_columns.iter().map(|&(idx, name)| {
            let mut value = record.get(idx).and_then(coerce_numeric);
            if value == Some(SENSOR_ERROR_SENTINEL) && SENTINEL_COLUMNS.contains(&name) {
                sentinel_rewrites += 1;
                value = None;
            }
            (name, value)
        });
        builder.push_row(timestamp, cells.collect::<Vec<_>>());
    }

    ParsedLog::finish(builder, sentinel_rewrites, skipped_rows)
}
