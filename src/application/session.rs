// Session controller - the single cooperative tick loop tying ingestion and analytics together
use crate::application::clock::Clock;
use crate::application::dashboard::Dashboard;
use crate::application::health_classifier::HealthClassifier;
use crate::application::line_decoder::decode_line;
use crate::application::line_source::{LineSource, SourceError, SourceEvent};
use crate::application::schema_registry::SchemaRegistry;
use crate::application::statistics::StatisticsEngine;
use crate::application::trend_store::TrendStore;
use crate::domain::frame::{FieldMap, TelemetryFrame};
use crate::domain::parameter::{self, TrendQuantity};
use crate::domain::reading::Reading;
use crate::domain::ring::RingBuffer;
use crate::domain::snapshot::{DashboardSnapshot, ParameterRow, QualitySummary, RawLine};
use crate::infrastructure::output::{OutputError, SessionOutput};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const RAW_LINES_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Connected,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("checkpoint write failed: {0}")]
    Checkpoint(#[source] OutputError),
    #[error("closing session output failed: {0}")]
    Output(#[source] OutputError),
    #[error("no line source attached")]
    NotConnected,
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub tick_interval: Duration,
    pub checkpoint_every: u64,
    pub history_capacity: usize,
    pub show_raw_data: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            checkpoint_every: 100,
            history_capacity: 1000,
            show_raw_data: true,
        }
    }
}

/// Cooperative termination flag, set from a signal handler and observed at
/// the top of every tick.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Accepted,
    NoLine,
    Exhausted,
}

/// Process-wide counters and the bounded recent history.
#[derive(Debug)]
pub struct SessionState {
    pub start_time: DateTime<Utc>,
    pub point_count: u64,
    pub update_rate: f64,
    last_arrival: DateTime<Utc>,
    history: RingBuffer<TelemetryFrame>,
}

impl SessionState {
    fn new(start_time: DateTime<Utc>, history_capacity: usize) -> Self {
        Self {
            start_time,
            point_count: 0,
            update_rate: 0.0,
            last_arrival: start_time,
            history: RingBuffer::new(history_capacity),
        }
    }

    fn record_arrival(&mut self, frame: TelemetryFrame) {
        let elapsed = (frame.timestamp - self.last_arrival)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        if elapsed > 0.0 {
            self.update_rate = 1.0 / elapsed;
        }
        self.last_arrival = frame.timestamp;
        self.point_count += 1;
        self.history.push(frame);
    }

}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_points: u64,
    pub runtime: Duration,
    pub average_rate: f64,
    pub parameters_tracked: usize,
}

pub struct Session {
    phase: SessionPhase,
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
    source: Option<Box<dyn LineSource>>,
    output: SessionOutput,
    schema: SchemaRegistry,
    statistics: StatisticsEngine,
    health: HealthClassifier,
    trends: TrendStore,
    state: SessionState,
    checkpoints_written: u64,
}

impl Session {
    pub fn new(settings: SessionSettings, output: SessionOutput, clock: Arc<dyn Clock>) -> Self {
        let state = SessionState::new(clock.now(), settings.history_capacity);
        Self {
            phase: SessionPhase::Idle,
            settings,
            clock,
            source: None,
            output,
            schema: SchemaRegistry::new(),
            statistics: StatisticsEngine::new(),
            health: HealthClassifier::new(),
            trends: TrendStore::new(),
            state,
            checkpoints_written: 0,
        }
    }

    /// Attach an acquired line source: `Idle -> Connected`.
    pub fn connect(&mut self, source: Box<dyn LineSource>) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Idle, "connect")?;
        tracing::info!(source = source.name(), "line source connected");
        self.source = Some(source);
        self.phase = SessionPhase::Connected;
        Ok(())
    }

    /// Enter the tick loop: `Connected -> Running`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Connected, "start")?;
        self.phase = SessionPhase::Running;
        Ok(())
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Run ticks until the shutdown flag is raised, the stream ends, or a
    /// fatal error occurs, then shut down. A final checkpoint is attempted on
    /// every exit path.
    pub async fn run(
        &mut self,
        shutdown: &ShutdownFlag,
        dashboard: &mut dyn Dashboard,
    ) -> Result<SessionSummary, SessionError> {
        self.start()?;
        let period = self.settings.tick_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            ticker.tick().await;
            if shutdown.is_requested() {
                tracing::info!("termination requested, saving data and shutting down");
                break Ok(());
            }

            match self.tick().await {
                Ok(TickOutcome::Exhausted) => {
                    tracing::info!("line source exhausted");
                    break Ok(());
                }
                Ok(_) => {}
                Err(err) => break Err(err),
            }

            let now = self.clock.now();
            if dashboard.refresh_due(now) {
                dashboard.refresh(&self.snapshot());
            }
        };

        let summary = self.shutdown().await;
        match (outcome, summary) {
            (Ok(()), summary) => summary,
            (Err(err), Ok(_)) => Err(err),
            (Err(err), Err(shutdown_err)) => {
                tracing::error!(error = %shutdown_err, "shutdown after failure was incomplete");
                Err(err)
            }
        }
    }

    /// One tick: a single bounded read and, if a line arrived, its ingestion.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        self.expect_phase(SessionPhase::Running, "tick")?;
        let source = self.source.as_mut().ok_or(SessionError::NotConnected)?;

        match source.next_line().await? {
            SourceEvent::Line(line) => {
                let line = line.trim();
                if line.is_empty() {
                    return Ok(TickOutcome::NoLine);
                }
                self.ingest_line(line)?;
                Ok(TickOutcome::Accepted)
            }
            SourceEvent::Timeout => Ok(TickOutcome::NoLine),
            SourceEvent::Exhausted => Ok(TickOutcome::Exhausted),
        }
    }

    fn ingest_line(&mut self, line: &str) -> Result<(), SessionError> {
        let now = self.clock.now();
        let fields = decode_line(line);
        if fields.is_empty() {
            tracing::debug!(line, "line produced no fields");
        }

        let added = self.schema.observe(&fields);
        self.persist_row(&fields, now);
        if added > 0 && !self.schema.late_columns().is_empty() {
            tracing::info!(
                late_columns = ?self.schema.late_columns(),
                "parameters appended after the data log header"
            );
        }

        for (key, raw) in fields.iter() {
            let reading = Reading::classify(key, raw);
            self.health.record(key, &reading, now);
            if let Some(value) = reading.value() {
                self.statistics.update(key, value);
                if let Some(quantity) = TrendQuantity::for_key(key) {
                    self.trends.record(quantity, value);
                }
            }
        }
        self.state
            .record_arrival(TelemetryFrame::new(now, line.to_string(), fields));

        if self.state.point_count % self.settings.checkpoint_every.max(1) == 0 {
            self.write_checkpoint(now)?;
        }
        Ok(())
    }

    /// Append the frame's row to the data log, preceded by the header until
    /// one header write succeeds. A failed write loses the row but does not
    /// stop the session.
    fn persist_row(&mut self, fields: &FieldMap, now: DateTime<Utc>) {
        let row = self.schema.row_for(fields, now);
        let Some(log) = self.output.data_log() else {
            return;
        };

        let written = self
            .schema
            .emit_header_once(|columns| log.write_header(columns))
            .and_then(|_| log.write_row(&row));
        if let Err(err) = written {
            tracing::error!(error = %err, "data log write failed");
        }
    }

    fn write_checkpoint(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let Some(log) = self.output.stats_log() else {
            return Ok(());
        };
        let rows = log
            .write_checkpoint(now, &self.statistics)
            .map_err(SessionError::Checkpoint)?;
        self.checkpoints_written += 1;
        tracing::debug!(rows, points = self.state.point_count, "statistics checkpoint written");
        Ok(())
    }

    /// `-> ShuttingDown -> Stopped`: final checkpoint, then release the line
    /// source and output handles.
    pub async fn shutdown(&mut self) -> Result<SessionSummary, SessionError> {
        if matches!(self.phase, SessionPhase::Stopped | SessionPhase::ShuttingDown) {
            return Err(SessionError::InvalidTransition {
                action: "shut down",
                phase: self.phase,
            });
        }
        self.phase = SessionPhase::ShuttingDown;
        let now = self.clock.now();

        let checkpoint = self.write_checkpoint(now);
        if let Some(source) = self.source.take() {
            tracing::info!(source = source.name(), "line source closed");
        }
        let closed = self.output.close();
        self.phase = SessionPhase::Stopped;

        let summary = self.summary(now);
        if summary.total_points > 0 {
            tracing::info!(
                total_points = summary.total_points,
                runtime_secs = summary.runtime.as_secs(),
                average_rate_hz = format!("{:.1}", summary.average_rate),
                parameters_tracked = summary.parameters_tracked,
                columns = self.schema.columns().len(),
                checkpoints = self.checkpoints_written,
                "session summary"
            );
        }

        checkpoint?;
        closed.map_err(SessionError::Output)?;
        Ok(summary)
    }

    fn summary(&self, now: DateTime<Utc>) -> SessionSummary {
        let runtime = (now - self.state.start_time).to_std().unwrap_or_default();
        let secs = runtime.as_secs_f64();
        SessionSummary {
            total_points: self.state.point_count,
            runtime,
            average_rate: if secs > 0.0 {
                self.state.point_count as f64 / secs
            } else {
                0.0
            },
            parameters_tracked: self.statistics.len(),
        }
    }

    /// Owned copy of everything the dashboard draws.
    pub fn snapshot(&self) -> DashboardSnapshot {
        let now = self.clock.now();
        let parameters = self
            .state
            .history
            .latest()
            .map(|frame| self.parameter_rows(&frame.fields))
            .unwrap_or_default();

        let raw_lines = if self.settings.show_raw_data {
            self.state
                .history
                .last_n(RAW_LINES_SHOWN)
                .map(|frame| RawLine {
                    timestamp: frame.timestamp,
                    text: frame.raw_text.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        DashboardSnapshot {
            taken_at: now,
            runtime: (now - self.state.start_time).to_std().unwrap_or_default(),
            point_count: self.state.point_count,
            update_rate: self.state.update_rate,
            data_log: self.output.data_log_name().to_string(),
            stats_log: self.output.stats_log_name().map(str::to_string),
            parameters,
            raw_lines,
            speed_trend: self.trends.short(TrendQuantity::WindSpeed).to_vec(),
            temperature_trend: self.trends.short(TrendQuantity::Temperature).to_vec(),
            wind: self.trends.wind_summary(),
            quality: QualitySummary {
                total_readings: self.health.total_readings(),
                error_count: self.health.error_count(),
                error_rate: self.health.error_rate(),
                last_error_time: self.health.last_error_time(),
                key_sensors: self.health.key_sensor_statuses(),
            },
        }
    }

    fn parameter_rows(&self, fields: &FieldMap) -> Vec<ParameterRow> {
        fields
            .iter()
            .map(|(key, raw)| {
                let stat = self.statistics.get(key);
                ParameterRow {
                    key: key.to_string(),
                    raw: raw.to_string(),
                    unit: parameter::ParameterFamily::of(key).unit(),
                    quality: parameter::quality(key, raw),
                    current: Reading::classify(key, raw).value(),
                    min: stat.map(|s| s.min()),
                    max: stat.map(|s| s.max()),
                    mean: stat.map(|s| s.mean()),
                    count: stat.map(|s| s.count()).unwrap_or(0),
                }
            })
            .collect()
    }
}

/// Read access for inspecting a session from tests.
#[cfg(test)]
impl Session {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn statistics(&self) -> &StatisticsEngine {
        &self.statistics
    }

    pub fn health(&self) -> &HealthClassifier {
        &self.health
    }

    pub fn trends(&self) -> &TrendStore {
        &self.trends
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn checkpoints_written(&self) -> u64 {
        self.checkpoints_written
    }
}

#[cfg(test)]
impl SessionState {
    pub fn history(&self) -> &RingBuffer<TelemetryFrame> {
        &self.history
    }
}
