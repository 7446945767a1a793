//! Clock port.

use chrono::{DateTime, Utc};

/// Source of wall-clock time for step timings and history records.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
