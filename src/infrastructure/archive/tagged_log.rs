// Parser for the older bracket-tagged logs: `[<timestamp>] , S 1.2, D 90, ...`
use super::detector::TAGGED_LINE;
use super::timestamp::parse_timestamp;
use super::{ArchiveError, ParsedLog, coerce_numeric};
use crate::domain::record_set::RecordSetBuilder;
use std::path::Path;

fn is_control_noise(line: &str) -> bool {
    line.contains("Mode") && line.contains("overriding")
}

pub fn parse_tagged_log(path: &Path) -> Result<ParsedLog, ArchiveError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut builder = RecordSetBuilder::new();
    let mut skipped_rows = 0usize;

    for line in text.lines().filter(|line| !is_control_noise(line)) {
        let Some(captures) = TAGGED_LINE.captures(line.trim_end()) else {
            continue;
        };
        let (stamp, tail) = (&captures[1], &captures[2]);

        let Some(timestamp) = parse_timestamp(stamp) else {
            skipped_rows += 1;
            continue;
        };

        let cells: Vec<(&str, Option<f64>)> = tail
            .trim()
            .split(',')
            .filter_map(|pair| pair.trim().split_once(char::is_whitespace))
            .map(|(key, value)| (key, coerce_numeric(value)))
            .collect();
        builder.push_row(timestamp, cells);
    }

    ParsedLog::finish(builder, 0, skipped_rows)
}
