// Console dashboard - renders session snapshots as a terminal UI
use crate::application::dashboard::Dashboard;
use crate::domain::health::SensorStatus;
use crate::domain::parameter::{Quality, compass_point};
use crate::domain::snapshot::{DashboardSnapshot, WindSummary};
use chrono::{DateTime, Utc};
use crossterm::ExecutableCommand;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Sparkline, Table};
use std::io::{self, Stdout};
use std::time::Duration;

/// Bar heights are scaled into `1..=SPARK_MAX` so a flat trend still shows.
const SPARK_MAX: u64 = 100;

/// Redraws at most once per `refresh_interval`.
pub struct ConsoleDashboard<B: Backend> {
    terminal: Terminal<B>,
    refresh_interval: Duration,
    last_render: Option<DateTime<Utc>>,
}

impl ConsoleDashboard<CrosstermBackend<Stdout>> {
    /// Switch stdout to the alternate screen. Raw mode stays off so Ctrl+C
    /// still arrives as SIGINT.
    pub fn stdout(refresh_interval: Duration) -> io::Result<Self> {
        let mut out = io::stdout();
        out.execute(EnterAlternateScreen)?;
        let mut dashboard = Self::new(CrosstermBackend::new(out), refresh_interval)?;
        dashboard.terminal.clear()?;
        Ok(dashboard)
    }

    pub fn restore(&mut self) {
        let restored = self
            .terminal
            .show_cursor()
            .and_then(|_| self.terminal.backend_mut().execute(LeaveAlternateScreen).map(|_| ()));
        if let Err(err) = restored {
            tracing::warn!(error = %err, "terminal restore failed");
        }
    }
}

impl<B: Backend> ConsoleDashboard<B> {
    pub fn new(backend: B, refresh_interval: Duration) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            refresh_interval,
            last_render: None,
        })
    }
}

impl<B: Backend> Dashboard for ConsoleDashboard<B> {
    fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_render {
            None => true,
            Some(last) => (now - last).to_std().is_ok_and(|elapsed| elapsed >= self.refresh_interval),
        }
    }

    fn refresh(&mut self, snapshot: &DashboardSnapshot) {
        self.last_render = Some(snapshot.taken_at);
        if let Err(err) = self.terminal.draw(|frame| draw(frame, snapshot)) {
            tracing::warn!(error = %err, "dashboard draw failed");
        }
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn format_runtime(runtime: Duration) -> String {
    let secs = runtime.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn quality_color(quality: Quality) -> Color {
    match quality {
        Quality::Good => Color::Green,
        Quality::Check => Color::Yellow,
        Quality::Unknown => Color::Gray,
        Quality::Invalid => Color::Red,
    }
}

fn status_color(status: SensorStatus) -> Color {
    match status {
        SensorStatus::Good => Color::Green,
        SensorStatus::Unknown => Color::Gray,
        SensorStatus::Error | SensorStatus::Offline => Color::Yellow,
        SensorStatus::Malfunction => Color::Red,
    }
}

/// Rescale a trend buffer between its own extremes for the sparkline widget.
fn scale_trend(values: &[f64]) -> Vec<u64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span > 0.0 {
                1 + ((v - min) / span * (SPARK_MAX - 1) as f64).round() as u64
            } else {
                1
            }
        })
        .collect()
}

fn draw(frame: &mut Frame, snapshot: &DashboardSnapshot) {
    let table_height = snapshot.parameters.len().max(1) as u16 + 3;
    let raw_height = if snapshot.raw_lines.is_empty() {
        0
    } else {
        snapshot.raw_lines.len() as u16 + 2
    };
    let [header, parameters, middle, quality, raw] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(table_height),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(raw_height),
    ])
    .areas(frame.area());

    draw_header(frame, header, snapshot);
    draw_parameters(frame, parameters, snapshot);

    let [wind, trends] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(middle);
    draw_wind(frame, wind, snapshot.wind.as_ref());
    draw_trends(frame, trends, snapshot);

    draw_quality(frame, quality, snapshot);
    if raw_height > 0 {
        draw_raw(frame, raw, snapshot);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let lines = vec![
        Line::from(format!(
            "Runtime: {} | Points: {} | Update Rate: {:.1} Hz",
            format_runtime(snapshot.runtime),
            snapshot.point_count,
            snapshot.update_rate
        )),
        Line::from(format!(
            "Log: {} | Stats: {}",
            snapshot.data_log,
            snapshot.stats_log.as_deref().unwrap_or("disabled")
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(panel("Trisonica Logger")), area);
}

fn draw_parameters(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let block = panel("Live Data & Statistics");
    if snapshot.parameters.is_empty() {
        frame.render_widget(Paragraph::new("Waiting for data...").block(block), area);
        return;
    }

    let header = Row::new(["Parameter", "Current", "Unit", "Quality", "Min", "Max", "Mean", "Count"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = snapshot.parameters.iter().map(|row| {
        let current = row.current.map_or_else(|| row.raw.clone(), |v| format!("{v:.2}"));
        Row::new(vec![
            Span::raw(row.key.clone()),
            Span::raw(current),
            Span::raw(row.unit),
            Span::styled(row.quality.label(), Style::default().fg(quality_color(row.quality))),
            Span::raw(cell(row.min)),
            Span::raw(cell(row.max)),
            Span::raw(cell(row.mean)),
            Span::raw(row.count.to_string()),
        ])
    });
    let widths = [
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn draw_wind(frame: &mut Frame, area: Rect, wind: Option<&WindSummary>) {
    let block = panel("Wind");
    let Some(wind) = wind else {
        frame.render_widget(
            Paragraph::new("Collecting wind data (waiting for S/S2 and D)...").block(block),
            area,
        );
        return;
    };

    let lines = vec![
        Line::from(format!(
            "Wind: {:.2} m/s {} ({:.0}°)",
            wind.current_speed,
            compass_point(wind.current_direction),
            wind.current_direction
        )),
        Line::from(format!(
            "Recent (last {}): min {:.2}  max {:.2}  avg {:.2}",
            wind.recent_count, wind.recent_min, wind.recent_max, wind.recent_avg
        )),
        Line::from(format!(
            "Mean Dir: {:.0}° ({})  Dir Range: {:.0}°",
            wind.mean_direction,
            compass_point(wind.mean_direction),
            wind.direction_range
        )),
        Line::from(format!("Gust: +{:.2} m/s", wind.gust)),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_trends(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let [speed, temperature] =
        Layout::vertical([Constraint::Length(3), Constraint::Length(3)]).areas(area);

    for (rect, title, values, color) in [
        (speed, "Speed trend", &snapshot.speed_trend, Color::Cyan),
        (temperature, "Temp trend", &snapshot.temperature_trend, Color::Magenta),
    ] {
        let scaled = scale_trend(values);
        let sparkline = Sparkline::default()
            .block(panel(title))
            .data(&scaled)
            .max(SPARK_MAX)
            .style(Style::default().fg(color));
        frame.render_widget(sparkline, rect);
    }
}

fn draw_quality(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let quality = &snapshot.quality;
    let mut sensors = vec![Span::raw("Sensors: ")];
    for (key, status) in &quality.key_sensors {
        sensors.push(Span::raw(format!("{key}: ")));
        sensors.push(Span::styled(status.label(), Style::default().fg(status_color(*status))));
        sensors.push(Span::raw("  "));
    }

    let mut summary = format!(
        "{} readings, {} errors ({:.1}%)",
        quality.total_readings, quality.error_count, quality.error_rate
    );
    if let Some(last_error) = quality.last_error_time {
        summary.push_str(&format!(" | Last error: {}", last_error.format("%H:%M:%S")));
    }

    let lines = vec![Line::from(summary), Line::from(sensors)];
    frame.render_widget(Paragraph::new(lines).block(panel("Data Quality")), area);
}

fn draw_raw(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let lines: Vec<Line> = snapshot
        .raw_lines
        .iter()
        .map(|line| Line::from(format!("{} {}", line.timestamp.format("%H:%M:%S%.3f"), line.text)))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel("Raw Data Stream")), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{ParameterRow, QualitySummary, RawLine};
    use chrono::TimeZone;
    use ratatui::backend::TestBackend;

    fn snapshot(taken_at: DateTime<Utc>) -> DashboardSnapshot {
        DashboardSnapshot {
            taken_at,
            runtime: Duration::from_secs(3725),
            point_count: 42,
            update_rate: 9.87,
            data_log: "TrisonicaData_2024-01-01_100000.csv".into(),
            stats_log: None,
            parameters: vec![ParameterRow {
                key: "S".into(),
                raw: "1.50".into(),
                unit: "m/s",
                quality: Quality::Good,
                current: Some(1.5),
                min: Some(0.5),
                max: Some(2.5),
                mean: Some(1.25),
                count: 42,
            }],
            raw_lines: vec![RawLine {
                timestamp: taken_at,
                text: "S 1.50 D 90".into(),
            }],
            speed_trend: vec![0.5, 1.5, 2.5],
            temperature_trend: Vec::new(),
            wind: Some(WindSummary {
                current_speed: 1.5,
                current_direction: 90.0,
                recent_count: 42,
                recent_min: 0.5,
                recent_max: 2.5,
                recent_avg: 1.25,
                mean_direction: 85.0,
                gust: 1.25,
                direction_range: 30.0,
            }),
            quality: QualitySummary {
                total_readings: 84,
                error_count: 0,
                error_rate: 0.0,
                last_error_time: None,
                key_sensors: vec![("S".into(), SensorStatus::Good), ("P".into(), SensorStatus::Unknown)],
            },
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn test_dashboard() -> ConsoleDashboard<TestBackend> {
        ConsoleDashboard::new(TestBackend::new(120, 30), Duration::from_secs(1)).unwrap()
    }

    /// Buffer contents, one terminal row per line.
    fn screen(dashboard: &ConsoleDashboard<TestBackend>) -> String {
        let buffer = dashboard.terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_render_snapshot() {
        let mut dashboard = test_dashboard();
        dashboard.refresh(&snapshot(at(0)));
        let text = screen(&dashboard);

        assert!(text.contains("Trisonica Logger"));
        assert!(text.contains("Runtime: 1:02:05"));
        assert!(text.contains("Points: 42"));
        assert!(text.contains("Update Rate: 9.9 Hz"));
        assert!(text.contains("Stats: disabled"));
        assert!(text.contains("Wind: 1.50 m/s E (90°)"));
        assert!(text.contains("Mean Dir: 85° (E)"));
        assert!(text.contains("S: Good  P: Unknown"));
        assert!(text.contains("S 1.50 D 90"));
        assert!(!text.contains("Last error"));
        assert!(text.contains("Speed trend"));
        assert!(text.contains('█'));
    }

    #[test]
    fn test_render_parameter_table() {
        let mut dashboard = test_dashboard();
        dashboard.refresh(&snapshot(at(0)));
        let text = screen(&dashboard);

        let header = text.lines().find(|line| line.contains("Parameter")).unwrap();
        assert!(header.contains("Current") && header.contains("Count"));
        let row = text.lines().find(|line| line.contains("1.50") && line.contains("m/s")).unwrap();
        assert!(row.contains("Good"));
        assert!(row.contains("2.50"));
        assert!(row.contains("42"));
    }

    #[test]
    fn test_render_waiting() {
        let mut snap = snapshot(at(0));
        snap.parameters.clear();
        snap.wind = None;
        snap.raw_lines.clear();

        let mut dashboard = test_dashboard();
        dashboard.refresh(&snap);
        let text = screen(&dashboard);
        assert!(text.contains("Waiting for data..."));
        assert!(text.contains("Collecting wind data"));
        assert!(!text.contains("Raw Data Stream"));
    }

    #[test]
    fn test_scale_trend() {
        assert!(scale_trend(&[]).is_empty());
        assert_eq!(scale_trend(&[3.0, 3.0]), vec![1, 1]);
        assert_eq!(scale_trend(&[0.0, 7.0]), vec![1, SPARK_MAX]);
    }

    #[test]
    fn test_refresh_is_throttled() {
        let mut dashboard = test_dashboard();

        assert!(dashboard.refresh_due(at(0)));
        dashboard.refresh(&snapshot(at(0)));
        assert!(!dashboard.refresh_due(at(0)));
        assert!(dashboard.refresh_due(at(1)));
        assert!(screen(&dashboard).contains("Trisonica Logger"));
    }
}
