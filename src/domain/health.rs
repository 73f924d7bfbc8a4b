// Sensor health domain model
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorStatus {
    #[default]
    Unknown,
    Good,
    Error,
    Malfunction,
    Offline,
}

impl SensorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Good => "Good",
            Self::Error => "Error",
            Self::Malfunction => "Broken",
            Self::Offline => "Offline",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorHealth {
    pub status: SensorStatus,
    /// Session-wide error percentage at the time of this sensor's last reading.
    pub error_rate: f64,
    pub last_good_reading: Option<DateTime<Utc>>,
}
