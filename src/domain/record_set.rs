// Canonical record set - the time-indexed table every archive parser produces
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    /// One entry per column; `None` marks a missing value.
    pub values: Vec<Option<f64>>,
}

/// Time-ordered table with one column per parameter.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Values of a column in time order, missing entries included.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    #[cfg(test)]
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.values[idx])
    }

    /// Summary of the non-missing values of a column.
    pub fn summarize(&self, name: &str) -> Option<ColumnSummary> {
        let values: Vec<f64> = self.column(name)?.into_iter().flatten().collect();
        ColumnSummary::from_values(&values)
    }

    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.rows.first()?.timestamp, self.rows.last()?.timestamp))
    }
}

/// Min/max/mean and sample standard deviation of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub points: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = (values.len() > 1).then(|| {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        });

        Some(Self {
            points: values.len(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev,
        })
    }
}

/// Accumulates sparse rows, discovering columns as they appear.
#[derive(Debug, Default)]
pub struct RecordSetBuilder {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<(DateTime<Utc>, Vec<(usize, Option<f64>)>)>,
}

impl RecordSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Self::new();
        for column in columns {
            builder.column_slot(&column.into());
        }
        builder
    }

    fn column_slot(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn push_row<I, S>(&mut self, timestamp: DateTime<Utc>, cells: I)
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: AsRef<str>,
    {
        let cells = cells
            .into_iter()
            .map(|(name, value)| (self.column_slot(name.as_ref()), value))
            .collect();
        self.rows.push((timestamp, cells));
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Pad every row to the full width and order rows by timestamp.
    pub fn finish(self) -> RecordSet {
        let width = self.columns.len();
        let mut rows: Vec<Record> = self
            .rows
            .into_iter()
            .map(|(timestamp, cells)| {
                let mut values = vec![None; width];
                for (idx, value) in cells {
                    values[idx] = value;
                }
                Record { timestamp, values }
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);

        RecordSet {
            columns: self.columns,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, sec).unwrap()
    }

    #[test]
    fn test_builder_pads_and_sorts() {
        let mut builder = RecordSetBuilder::new();
        builder.push_row(at(2), [("S", Some(2.0)), ("D", Some(90.0))]);
        builder.push_row(at(1), [("S", Some(1.0))]);
        builder.push_row(at(3), [("T", None)]);
        let set = builder.finish();

        assert_eq!(set.columns(), &["S", "D", "T"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.time_span().unwrap().0, at(1));
        assert_eq!(set.value(0, "S"), Some(1.0));
        assert_eq!(set.value(0, "D"), None);
        assert_eq!(set.column("D").unwrap(), vec![None, Some(90.0), None]);
        assert_eq!(set.time_span(), Some((at(1), at(3))));
    }

    #[test]
    fn test_summarize_skips_missing() {
        let mut builder = RecordSetBuilder::with_columns(["S"]);
        for (sec, v) in [(0, Some(2.0)), (1, None), (2, Some(4.0))] {
            builder.push_row(at(sec), [("S", v)]);
        }
        let summary = builder.finish().summarize("S").unwrap();

        assert_eq!(summary.points, 2);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.mean, 3.0);
        assert!((summary.std_dev.unwrap() - 2f64.sqrt()).abs() < 1e-12);
    }
}
