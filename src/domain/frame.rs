// Telemetry frame domain model
use chrono::{DateTime, Utc};

/// Ordered parameter-name to raw-value mapping. Insertion order is the order
/// keys were first seen; re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One accepted line: immutable once built.
#[derive(Debug, Clone)]
pub struct TelemetryFrame {
    pub timestamp: DateTime<Utc>,
    pub raw_text: String,
    pub fields: FieldMap,
}

impl TelemetryFrame {
    pub fn new(timestamp: DateTime<Utc>, raw_text: String, fields: FieldMap) -> Self {
        Self {
            timestamp,
            raw_text,
            fields,
        }
    }
}
