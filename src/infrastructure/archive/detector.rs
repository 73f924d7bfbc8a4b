// Log format detection from the first two lines of an archived file
use super::LogFormat;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

/// `[<timestamp>] , ...` as written by the older tagged logger.
pub(crate) static TAGGED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*?)\]\s*,(.*)$").expect("tagged line pattern is valid"));

const CSV_TIMESTAMP_TOKENS: [&str; 2] = ["Time", "timestamp"];
const JSON_MARKER: &str = "parsed_json";

/// Classify a file. I/O failures are logged and yield `Unknown`.
pub fn detect_format(path: &Path) -> LogFormat {
    match read_leading_lines(path) {
        Ok((first, second)) => detect_from_lines(&first, &second),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read log for format detection");
            LogFormat::Unknown
        }
    }
}

/// First match wins: csv header, tagged lines, json marker.
pub fn detect_from_lines(first: &str, second: &str) -> LogFormat {
    let (first, second) = (first.trim(), second.trim());

    if first.contains(',') && CSV_TIMESTAMP_TOKENS.iter().any(|token| first.contains(token)) {
        return LogFormat::Csv;
    }
    if TAGGED_LINE.is_match(first) || TAGGED_LINE.is_match(second) {
        return LogFormat::Tagged;
    }
    if first.contains(JSON_MARKER) {
        return LogFormat::Json;
    }
    LogFormat::Unknown
}

fn read_leading_lines(path: &Path) -> std::io::Result<(String, String)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut first = String::new();
    let mut second = String::new();
    reader.read_line(&mut first)?;
    reader.read_line(&mut second)?;
    Ok((first, second))
}
