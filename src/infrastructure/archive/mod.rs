// Archived log adapters - format detection and the per-format parsers
pub mod csv_log;
pub mod detector;
pub mod json_log;
pub mod tagged_log;
pub mod timestamp;

use crate::application::archive_service::LogArchive;
use crate::domain::record_set::{RecordSet, RecordSetBuilder};
use std::fmt;
use std::path::Path;

pub use detector::detect_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Csv,
    Tagged,
    Json,
    Unknown,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Csv => "csv",
            LogFormat::Tagged => "tagged",
            LogFormat::Json => "json",
            LogFormat::Unknown => "unknown",
        })
    }
}

/// Why a file produced no records.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("no timestamp column (expected Time, timestamp or Timestamp)")]
    MissingTimestampColumn,
    #[error("missing required columns: {0}")]
    MissingColumns(String),
    #[error("no usable rows")]
    NoUsableRows,
    #[error("unrecognized log format")]
    UnknownFormat,
}

#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub records: RecordSet,
    /// Speed cells whose `-99.50` sentinel was rewritten to missing.
    pub sentinel_rewrites: usize,
    /// Rows dropped for an unparseable timestamp or payload.
    pub skipped_rows: usize,
}

impl ParsedLog {
    fn finish(
        builder: RecordSetBuilder,
        sentinel_rewrites: usize,
        skipped_rows: usize,
    ) -> Result<Self, ArchiveError> {
        if builder.row_count() == 0 {
            return Err(ArchiveError::NoUsableRows);
        }
        Ok(Self {
            records: builder.finish(),
            sentinel_rewrites,
            skipped_rows,
        })
    }
}

/// Numeric coercion for archived cells; anything else is missing.
fn coerce_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse with an explicit format, bypassing detection.
pub fn parse_as(path: &Path, format: LogFormat) -> Result<ParsedLog, ArchiveError> {
    match format {
        LogFormat::Csv => csv_log::parse_csv_log(path),
        LogFormat::Tagged => tagged_log::parse_tagged_log(path),
        LogFormat::Json => json_log::parse_json_log(path),
        LogFormat::Unknown => Err(ArchiveError::UnknownFormat),
    }
}

/// File-system backed archive used by the inspection service.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileArchive;

impl LogArchive for FileArchive {
    fn detect(&self, path: &Path) -> LogFormat {
        detect_format(path)
    }

    fn parse(&self, path: &Path, format: LogFormat) -> Result<ParsedLog, ArchiveError> {
        parse_as(path, format)
    }
}
