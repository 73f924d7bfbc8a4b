// Health classifier - per-sensor status driven by the latest reading
use crate::domain::health::{SensorHealth, SensorStatus};
use crate::domain::parameter::ParameterFamily;
use crate::domain::reading::{DeviceCode, Reading};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Temperature readings above this are physically impossible.
const TEMPERATURE_MALFUNCTION_THRESHOLD: f64 = 100_000.0;

/// Sensors always listed in the quality summary, seen or not.
pub const KEY_SENSORS: [&str; 5] = ["S", "T", "P", "D", "H"];

#[derive(Debug, Default)]
pub struct HealthClassifier {
    sensors: HashMap<String, SensorHealth>,
    total_readings: u64,
    error_count: u64,
    last_error_time: Option<DateTime<Utc>>,
}

impl HealthClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one reading. Every decoded field counts as one reading;
    /// the error rate is a single session-wide ratio shared by all sensors.
    pub fn record(&mut self, parameter: &str, reading: &Reading, now: DateTime<Utc>) -> SensorStatus {
        self.total_readings += 1;

        let status = match reading {
            Reading::Unparseable | Reading::DeviceError(DeviceCode::SensorError) => {
                self.error_count += 1;
                self.last_error_time = Some(now);
                SensorStatus::Error
            }
            Reading::DeviceError(DeviceCode::PressureOffline) => SensorStatus::Offline,
            Reading::Value(v)
                if ParameterFamily::of(parameter) == ParameterFamily::Temperature
                    && *v > TEMPERATURE_MALFUNCTION_THRESHOLD =>
            {
                SensorStatus::Malfunction
            }
            Reading::Value(_) => SensorStatus::Good,
        };

        let error_rate = self.error_rate();
        let sensor = self.sensors.entry(parameter.to_string()).or_default();
        sensor.status = status;
        sensor.error_rate = error_rate;
        if status == SensorStatus::Good {
            sensor.last_good_reading = Some(now);
        }

        if status != SensorStatus::Good {
            tracing::debug!(parameter, ?status, ?reading, "sensor reading flagged");
        }
        status
    }

    pub fn get(&self, parameter: &str) -> Option<&SensorHealth> {
        self.sensors.get(parameter)
    }

    pub fn status(&self, parameter: &str) -> SensorStatus {
        self.get(parameter).map(|s| s.status).unwrap_or_default()
    }

    pub fn error_rate(&self) -> f64 {
        if self.total_readings == 0 {
            return 0.0;
        }
        100.0 * self.error_count as f64 / self.total_readings as f64
    }

    pub fn total_readings(&self) -> u64 {
        self.total_readings
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn last_error_time(&self) -> Option<DateTime<Utc>> {
        self.last_error_time
    }

    pub fn key_sensor_statuses(&self) -> Vec<(String, SensorStatus)> {
        KEY_SENSORS
            .iter()
            .map(|key| (key.to_string(), self.status(key)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn classify(health: &mut HealthClassifier, key: &str, raw: &str) -> SensorStatus {
        health.record(key, &Reading::classify(key, raw), now())
    }

    #[test]
    fn test_status_rules() {
        let mut health = HealthClassifier::new();
        assert_eq!(classify(&mut health, "P", "-99.70"), SensorStatus::Offline);
        assert_eq!(classify(&mut health, "T", "150000"), SensorStatus::Malfunction);
        assert_eq!(classify(&mut health, "S", "-99.50"), SensorStatus::Error);
        assert_eq!(classify(&mut health, "H", "45.2"), SensorStatus::Good);
        assert_eq!(classify(&mut health, "D", "n/a"), SensorStatus::Error);
        // True heading is not a temperature, however large.
        assert_eq!(classify(&mut health, "TD", "150000"), SensorStatus::Good);
    }

    #[test]
    fn test_unseen_sensor_is_unknown() {
        let health = HealthClassifier::new();
        assert_eq!(health.status("S"), SensorStatus::Unknown);
        assert_eq!(health.error_rate(), 0.0);
        assert!(
            health
                .key_sensor_statuses()
                .iter()
                .all(|(_, s)| *s == SensorStatus::Unknown)
        );
    }

    #[test]
    fn test_status_follows_latest_reading() {
        let mut health = HealthClassifier::new();
        classify(&mut health, "S", "-99.50");
        assert_eq!(health.status("S"), SensorStatus::Error);
        assert!(health.get("S").unwrap().last_good_reading.is_none());

        classify(&mut health, "S", "3.2");
        assert_eq!(health.status("S"), SensorStatus::Good);
        assert_eq!(health.get("S").unwrap().last_good_reading, Some(now()));
    }

    #[test]
    fn test_error_rate_is_session_wide() {
        let mut health = HealthClassifier::new();
        classify(&mut health, "S", "-99.50");
        classify(&mut health, "T", "20.0");
        classify(&mut health, "H", "40.0");
        classify(&mut health, "P", "1000.0");

        assert_eq!(health.error_count(), 1);
        assert_eq!(health.total_readings(), 4);
        assert_eq!(health.error_rate(), 25.0);
        assert_eq!(health.get("P").unwrap().error_rate, 25.0);
        // S's rate was taken when it was last read.
        assert_eq!(health.get("S").unwrap().error_rate, 100.0);
        assert_eq!(health.last_error_time(), Some(now()));
    }
}
