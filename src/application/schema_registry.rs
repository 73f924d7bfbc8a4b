// Schema registry - append-only column order for the streaming data log
use crate::domain::frame::FieldMap;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Ordered, append-only set of parameter names, always led by the timestamp
/// column. A column's index never changes once assigned.
///
/// The data log header is written once, from the schema as it stands when
/// the first header write succeeds. Parameters discovered later keep their (appended)
/// position in every subsequent row but are never added to that header, so
/// such rows are wider than the header.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    columns: Vec<String>,
    known: HashSet<String>,
    header_width: Option<usize>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            columns: vec![TIMESTAMP_COLUMN.to_string()],
            known: HashSet::from([TIMESTAMP_COLUMN.to_string()]),
            header_width: None,
        }
    }

    /// Append unseen keys in discovery order, returning how many were added.
    pub fn observe(&mut self, fields: &FieldMap) -> usize {
        let before = self.columns.len();
        for key in fields.keys() {
            if self.known.insert(key.to_string()) {
                self.columns.push(key.to_string());
            }
        }
        self.columns.len() - before
    }

    /// Hand the header to `write` until one write succeeds. Returns whether
    /// the header was written by this call.
    pub fn emit_header_once<E>(
        &mut self,
        write: impl FnOnce(&[String]) -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.header_width.is_some() {
            return Ok(false);
        }
        write(&self.columns)?;
        self.header_width = Some(self.columns.len());
        Ok(true)
    }

    /// One value per schema column, empty where the frame has no value.
    pub fn row_for(&self, fields: &FieldMap, timestamp: DateTime<Utc>) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                if column == TIMESTAMP_COLUMN {
                    format_timestamp(timestamp)
                } else {
                    fields.get(column).unwrap_or_default().to_string()
                }
            })
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns discovered after the header was written.
    pub fn late_columns(&self) -> &[String] {
        match self.header_width {
            Some(width) => &self.columns[width..],
            None => &[],
        }
    }
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
