// Dashboard snapshot domain model - a read-only copy handed to renderers
use super::health::SensorStatus;
use super::parameter::Quality;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ParameterRow {
    pub key: String,
    pub raw: String,
    pub unit: &'static str,
    pub quality: Quality,
    pub current: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindSummary {
    pub current_speed: f64,
    pub current_direction: f64,
    pub recent_count: usize,
    pub recent_min: f64,
    pub recent_max: f64,
    pub recent_avg: f64,
    pub mean_direction: f64,
    pub gust: f64,
    pub direction_range: f64,
}

#[derive(Debug, Clone)]
pub struct QualitySummary {
    pub total_readings: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub last_error_time: Option<DateTime<Utc>>,
    pub key_sensors: Vec<(String, SensorStatus)>,
}

#[derive(Debug, Clone)]
pub struct RawLine {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub taken_at: DateTime<Utc>,
    pub runtime: Duration,
    pub point_count: u64,
    pub update_rate: f64,
    pub data_log: String,
    pub stats_log: Option<String>,
    pub parameters: Vec<ParameterRow>,
    pub raw_lines: Vec<RawLine>,
    /// Short-horizon buffers, oldest first.
    pub speed_trend: Vec<f64>,
    pub temperature_trend: Vec<f64>,
    pub wind: Option<WindSummary>,
    pub quality: QualitySummary,
}
