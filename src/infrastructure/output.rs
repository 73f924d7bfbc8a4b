// Session output files - the streaming data log and the statistics checkpoint log
use crate::application::schema_registry::format_timestamp;
use crate::application::statistics::StatisticsEngine;
use chrono::{DateTime, Local, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const STATS_HEADER: [&str; 7] = ["timestamp", "parameter", "min", "max", "mean", "std_dev", "count"];

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write to {path} failed: {source}")]
    Write { path: PathBuf, source: csv::Error },
    #[error("flush of {path} failed: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Delimited data log, one row per accepted frame. Each record is encoded
/// on its own and written straight to the file, so a failed write leaves
/// nothing queued behind it. Rows may be wider than the header when
/// parameters appear after it.
pub struct DataLog {
    path: PathBuf,
    file: File,
}

impl DataLog {
    pub fn create(path: PathBuf) -> Result<Self, OutputError> {
        let file = File::create(&path).map_err(|source| OutputError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_header(&mut self, columns: &[String]) -> Result<(), OutputError> {
        self.write_row(columns)
    }

    pub fn write_row(&mut self, values: &[String]) -> Result<(), OutputError> {
        let record = encode_record(values).map_err(|source| OutputError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.file
            .write_all(&record)
            .map_err(|source| OutputError::Write {
                path: self.path.clone(),
                source: source.into(),
            })
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        self.file.flush().map_err(|source| OutputError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

fn encode_record(values: &[String]) -> Result<Vec<u8>, csv::Error> {
    let mut encoder = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    encoder.write_record(values)?;
    encoder
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

/// Checkpoint log: one row per tracked parameter at every checkpoint. The
/// header goes out with the first checkpoint flush.
pub struct StatsLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl StatsLog {
    pub fn create(path: PathBuf) -> Result<Self, OutputError> {
        let file = File::create(&path).map_err(|source| OutputError::Create {
            path: path.clone(),
            source,
        })?;
        let mut log = Self {
            path,
            writer: csv::Writer::from_writer(file),
        };
        log.write(&STATS_HEADER)?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_checkpoint(
        &mut self,
        timestamp: DateTime<Utc>,
        statistics: &StatisticsEngine,
    ) -> Result<usize, OutputError> {
        let stamp = format_timestamp(timestamp);
        let mut rows = 0;
        for (parameter, stat) in statistics.iter() {
            self.write(&[
                stamp.clone(),
                parameter.to_string(),
                format!("{:.6}", stat.min()),
                format!("{:.6}", stat.max()),
                format!("{:.6}", stat.mean()),
                format!("{:.6}", stat.std_dev()),
                stat.count().to_string(),
            ])?;
            rows += 1;
        }
        self.flush()?;
        Ok(rows)
    }

    fn write<I, T>(&mut self, record: I) -> Result<(), OutputError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|source| OutputError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush().map_err(|source| OutputError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

/// The open output handles of one logging session.
pub struct SessionOutput {
    data_log: Option<DataLog>,
    stats_log: Option<StatsLog>,
    data_name: String,
    stats_name: Option<String>,
}

impl SessionOutput {
    /// Create `TrisonicaData_<stamp>.csv` (and, when enabled,
    /// `TrisonicaStats_<stamp>.csv`) inside `log_dir`.
    pub fn create(
        log_dir: &Path,
        started: DateTime<Utc>,
        save_statistics: bool,
    ) -> Result<Self, OutputError> {
        std::fs::create_dir_all(log_dir).map_err(|source| OutputError::Create {
            path: log_dir.to_path_buf(),
            source,
        })?;
        let stamp = started.with_timezone(&Local).format("%Y-%m-%d_%H%M%S");

        let data_log = DataLog::create(log_dir.join(format!("TrisonicaData_{stamp}.csv")))?;
        let stats_log = if save_statistics {
            Some(StatsLog::create(
                log_dir.join(format!("TrisonicaStats_{stamp}.csv")),
            )?)
        } else {
            None
        };

        Ok(Self::new(data_log, stats_log))
    }

    pub fn new(data_log: DataLog, stats_log: Option<StatsLog>) -> Self {
        let output = Self {
            data_name: file_name(data_log.path()),
            stats_name: stats_log.as_ref().map(|s| file_name(s.path())),
            data_log: Some(data_log),
            stats_log,
        };
        if let Some(path) = output.data_log_path() {
            tracing::info!(data_log = %path.display(), "data log opened");
        }
        if let Some(path) = output.stats_log_path() {
            tracing::info!(stats_log = %path.display(), "statistics log opened");
        }
        output
    }

    pub fn data_log(&mut self) -> Option<&mut DataLog> {
        self.data_log.as_mut()
    }

    pub fn stats_log(&mut self) -> Option<&mut StatsLog> {
        self.stats_log.as_mut()
    }

    pub fn data_log_name(&self) -> &str {
        &self.data_name
    }

    pub fn stats_log_name(&self) -> Option<&str> {
        self.stats_name.as_deref()
    }

    pub fn data_log_path(&self) -> Option<&Path> {
        self.data_log.as_ref().map(DataLog::path)
    }

    pub fn stats_log_path(&self) -> Option<&Path> {
        self.stats_log.as_ref().map(StatsLog::path)
    }

    /// Flush and release both files. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), OutputError> {
        let mut result = Ok(());
        if let Some(mut log) = self.data_log.take() {
            if let Err(err) = log.flush() {
                result = Err(err);
            }
            tracing::info!(path = %log.path().display(), "data log saved");
        }
        if let Some(mut log) = self.stats_log.take() {
            if let Err(err) = log.flush() {
                result = Err(err);
            }
            tracing::info!(path = %log.path().display(), "statistics saved");
        }
        result
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
