// Dashboard trait - consumer of read-only session snapshots
use crate::domain::snapshot::DashboardSnapshot;
use chrono::{DateTime, Utc};

pub trait Dashboard {
    /// Snapshots are only built when this returns true.
    fn refresh_due(&self, _now: DateTime<Utc>) -> bool {
        true
    }

    fn refresh(&mut self, snapshot: &DashboardSnapshot);
}
