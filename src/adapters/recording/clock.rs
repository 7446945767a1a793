//! Recording adapter for the `Clock` port.

use chrono::{DateTime, Utc};

use super::{record_interaction, SharedRecorder};
use crate::ports::clock::Clock;

/// Records every clock reading.
pub struct RecordingClock {
    inner: Box<dyn Clock>,
    recorder: SharedRecorder,
}

impl RecordingClock {
    #[must_use]
    pub fn new(inner: Box<dyn Clock>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.inner.now();
        record_interaction(&self.recorder, "clock", "now", &(), &now.to_rfc3339());
        now
    }
}
