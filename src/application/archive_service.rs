// Archive service - Use case for loading and summarizing archived logs
use crate::domain::record_set::{ColumnSummary, RecordSet};
use crate::domain::reading::SENSOR_ERROR_SENTINEL;
use crate::infrastructure::archive::{ArchiveError, LogFormat, ParsedLog};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Source of archived logs. Parsers report failures as values and never panic.
pub trait LogArchive: Send + Sync {
    fn detect(&self, path: &Path) -> LogFormat;

    fn parse(&self, path: &Path, format: LogFormat) -> Result<ParsedLog, ArchiveError>;
}

#[derive(Debug)]
pub struct ArchiveOutcome {
    pub path: PathBuf,
    pub format: LogFormat,
    pub result: Result<ParsedLog, ArchiveError>,
}

#[derive(Debug, Default)]
pub struct ArchiveBatch {
    pub outcomes: Vec<ArchiveOutcome>,
    pub loaded: usize,
}

/// Per-file figures for the inspection report.
#[derive(Debug, Clone)]
pub struct LogSummary {
    pub rows: usize,
    pub time_span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub columns: Vec<(String, ColumnSummary)>,
    /// Most frequent valid bearing, with the speed column it was paired with.
    pub prevailing_direction: Option<(f64, String)>,
}

#[derive(Clone)]
pub struct ArchiveService {
    archive: Arc<dyn LogArchive>,
}

impl ArchiveService {
    pub fn new(archive: Arc<dyn LogArchive>) -> Self {
        Self { archive }
    }

    /// Load one file, detecting its format unless one is forced.
    pub fn load(&self, path: &Path, forced: Option<LogFormat>) -> ArchiveOutcome {
        let format = forced.unwrap_or_else(|| self.archive.detect(path));
        let result = self.archive.parse(path, format);

        match &result {
            Ok(parsed) => {
                info!(
                    path = %path.display(),
                    %format,
                    rows = parsed.records.len(),
                    columns = parsed.records.columns().len(),
                    skipped = parsed.skipped_rows,
                    "log loaded"
                );
                if parsed.sentinel_rewrites > 0 {
                    info!(
                        path = %path.display(),
                        cells = parsed.sentinel_rewrites,
                        "filtered -99.50 error values from wind speed columns"
                    );
                }
            }
            Err(ArchiveError::NoUsableRows) => {
                warn!(path = %path.display(), %format, "no valid data found");
            }
            Err(err) => {
                error!(path = %path.display(), %format, error = %err, "log skipped");
            }
        }

        ArchiveOutcome {
            path: path.to_path_buf(),
            format,
            result,
        }
    }

    /// Load every file, continuing past failures.
    pub fn load_all(&self, paths: &[PathBuf], forced: Option<LogFormat>) -> ArchiveBatch {
        let outcomes: Vec<ArchiveOutcome> = paths.iter().map(|path| self.load(path, forced)).collect();
        let loaded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(loaded, total = outcomes.len(), "archive batch complete");
        ArchiveBatch { outcomes, loaded }
    }
}

pub fn summarize(records: &RecordSet) -> LogSummary {
    let columns = records
        .columns()
        .iter()
        .filter_map(|name| records.summarize(name).map(|summary| (name.clone(), summary)))
        .collect();

    let prevailing = ["S2", "S"]
        .into_iter()
        .find(|speed| records.has_column(speed))
        .filter(|_| records.has_column("D"))
        .and_then(|speed| prevailing_direction(records, speed, "D").map(|dir| (dir, speed.to_string())));

    LogSummary {
        rows: records.len(),
        time_span: records.time_span(),
        columns,
        prevailing_direction: prevailing,
    }
}

/// Mode of the bearings whose paired speed is valid. Ties go to the smallest bearing.
pub fn prevailing_direction(records: &RecordSet, speed_column: &str, direction_column: &str) -> Option<f64> {
    let speeds = records.column(speed_column)?;
    let directions = records.column(direction_column)?;

    let mut valid: Vec<f64> = speeds
        .into_iter()
        .zip(directions)
        .filter_map(|(speed, direction)| match (speed, direction) {
            (Some(s), Some(d))
                if s >= 0.0 && s != SENSOR_ERROR_SENTINEL && (0.0..=360.0).contains(&d) =>
            {
                Some(d)
            }
            _ => None,
        })
        .collect();
    valid.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    for run in valid.chunk_by(|a, b| a == b) {
        if best.is_none_or(|(_, count)| run.len() > count) {
            best = Some((run[0], run.len()));
        }
    }
    best.map(|(direction, _)| direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record_set::RecordSetBuilder;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct StubArchive {
        formats: Vec<(PathBuf, LogFormat)>,
        parsed: Mutex<Vec<PathBuf>>,
    }

    impl LogArchive for StubArchive {
        fn detect(&self, path: &Path) -> LogFormat {
            self.formats
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, f)| *f)
                .unwrap_or(LogFormat::Unknown)
        }

        fn parse(&self, path: &Path, format: LogFormat) -> Result<ParsedLog, ArchiveError> {
            self.parsed.lock().unwrap().push(path.to_path_buf());
            match format {
                LogFormat::Unknown => Err(ArchiveError::UnknownFormat),
                LogFormat::Json => Err(ArchiveError::NoUsableRows),
                _ => {
                    let mut builder = RecordSetBuilder::new();
                    builder.push_row(ts(0), [("S", Some(1.0))]);
                    Ok(ParsedLog {
                        records: builder.finish(),
                        sentinel_rewrites: 0,
                        skipped_rows: 0,
                    })
                }
            }
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn service() -> (ArchiveService, Arc<StubArchive>) {
        let archive = Arc::new(StubArchive {
            formats: vec![
                (PathBuf::from("a.csv"), LogFormat::Csv),
                (PathBuf::from("b.json"), LogFormat::Json),
                (PathBuf::from("c.log"), LogFormat::Tagged),
            ],
            parsed: Mutex::new(Vec::new()),
        });
        (ArchiveService::new(archive.clone()), archive)
    }

    #[test]
    fn test_load_all_continues_past_failures() {
        let (service, archive) = service();
        let paths: Vec<PathBuf> = ["a.csv", "mystery.bin", "b.json", "c.log"]
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let batch = service.load_all(&paths, None);

        assert_eq!(batch.outcomes.len(), 4);
        assert_eq!(batch.loaded, 2);
        assert_eq!(batch.outcomes[1].format, LogFormat::Unknown);
        assert!(matches!(batch.outcomes[1].result, Err(ArchiveError::UnknownFormat)));
        assert!(matches!(batch.outcomes[2].result, Err(ArchiveError::NoUsableRows)));
        assert!(batch.outcomes[3].result.is_ok());
        assert_eq!(archive.parsed.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_forced_format_skips_detection() {
        let (service, _) = service();
        let outcome = service.load(Path::new("mystery.bin"), Some(LogFormat::Tagged));
        assert_eq!(outcome.format, LogFormat::Tagged);
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn test_prevailing_direction_uses_valid_pairs() {
        let mut builder = RecordSetBuilder::new();
        let rows = [
            (Some(1.0), Some(90.0)),
            (Some(2.0), Some(180.0)),
            (Some(SENSOR_ERROR_SENTINEL), Some(270.0)),
            (Some(-1.0), Some(270.0)),
            (None, Some(270.0)),
            (Some(1.5), Some(180.0)),
            (Some(1.5), Some(400.0)),
            (Some(1.5), Some(90.0)),
            (Some(1.5), Some(45.0)),
        ];
        for (i, (speed, direction)) in rows.into_iter().enumerate() {
            builder.push_row(ts(i as i64), [("S2", speed), ("D", direction)]);
        }
        let records = builder.finish();

        // 90 and 180 tie with two valid pairs each; 270 never pairs with a valid speed.
        assert_eq!(prevailing_direction(&records, "S2", "D"), Some(90.0));
    }

    #[test]
    fn test_summarize_prefers_horizontal_speed() {
        let mut builder = RecordSetBuilder::new();
        builder.push_row(ts(0), [("S", Some(3.0)), ("S2", Some(2.0)), ("D", Some(10.0))]);
        builder.push_row(ts(5), [("S", Some(5.0)), ("S2", Some(4.0)), ("D", Some(10.0))]);
        let summary = summarize(&builder.finish());

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns.len(), 3);
        assert_eq!(summary.columns[0].0, "S");
        assert_eq!(summary.columns[0].1.mean, 4.0);
        assert_eq!(summary.prevailing_direction, Some((10.0, "S2".to_string())));
        assert_eq!(summary.time_span, Some((ts(0), ts(5))));
    }

    #[test]
    fn test_summarize_without_direction() {
        let mut builder = RecordSetBuilder::new();
        builder.push_row(ts(0), [("T", Some(20.0))]);
        let summary = summarize(&builder.finish());
        assert!(summary.prevailing_direction.is_none());
    }
}
