use crate::application::session::SessionSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggerConfig {
    pub source: SourceSettings,
    pub output: OutputSettings,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Lines piped in on standard input.
    Stdin,
    /// A captured stream replayed from a file.
    Replay,
    /// A live serial port (requires the `serial` feature).
    Serial,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSettings {
    pub log_dir: PathBuf,
    pub save_statistics: bool,
    pub show_raw_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub tick_interval_ms: u64,
    pub checkpoint_every: u64,
    pub history_capacity: usize,
    pub dashboard_refresh_ms: u64,
}

impl SourceSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl LoggerConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            tick_interval: Duration::from_millis(self.session.tick_interval_ms),
            checkpoint_every: self.session.checkpoint_every,
            history_capacity: self.session.history_capacity,
            show_raw_data: self.output.show_raw_data,
        }
    }

    pub fn dashboard_refresh(&self) -> Duration {
        Duration::from_millis(self.session.dashboard_refresh_ms)
    }
}

/// Defaults, then `config/logger.*` (or `path`), then `ANEMO__SECTION__KEY`
/// environment variables.
pub fn load_logger_config(path: Option<&Path>) -> anyhow::Result<LoggerConfig> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config/logger").required(false),
    };

    let settings = config::Config::builder()
        .set_default("source.kind", "stdin")?
        .set_default("source.port", "-")?
        .set_default("source.baud_rate", 115_200_i64)?
        .set_default("source.read_timeout_ms", 1_000_i64)?
        .set_default("output.log_dir", "OUTPUT")?
        .set_default("output.save_statistics", true)?
        .set_default("output.show_raw_data", true)?
        .set_default("session.tick_interval_ms", 50_i64)?
        .set_default("session.checkpoint_every", 100_i64)?
        .set_default("session.history_capacity", 1_000_i64)?
        .set_default("session.dashboard_refresh_ms", 1_000_i64)?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("ANEMO")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = load_logger_config(None).unwrap();

        assert_eq!(config.source.kind, SourceKind::Stdin);
        assert_eq!(config.source.baud_rate, 115_200);
        assert_eq!(config.source.read_timeout(), Duration::from_secs(1));
        assert!(config.output.save_statistics);

        let session = config.session_settings();
        assert_eq!(session.checkpoint_every, 100);
        assert_eq!(session.history_capacity, 1000);
        assert_eq!(session.tick_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[source]\nkind = \"serial\"\nport = \"/dev/ttyUSB0\"\n\n[output]\nsave_statistics = false"
        )
        .unwrap();

        let config = load_logger_config(Some(&path)).unwrap();
        assert_eq!(config.source.kind, SourceKind::Serial);
        assert_eq!(config.source.port, "/dev/ttyUSB0");
        assert!(!config.output.save_statistics);
        assert_eq!(config.output.log_dir, PathBuf::from("OUTPUT"));
    }
}
