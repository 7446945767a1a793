//! Recording session shared by every recording adapter.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::recorder::CassetteRecorder;
use crate::adapters::recording::SharedRecorder;

/// One cassette collecting the interactions of every port, in call order.
///
/// A single file keeps the sequence numbers global, so a replayed session
/// sees the same interleaving of clock, filesystem, and git calls.
pub struct RecordingSession {
    recorder: SharedRecorder,
}

impl RecordingSession {
    /// Starts a session that will write to `path` on [`RecordingSession::finish`].
    #[must_use]
    pub fn new(path: &Path, name: &str, commit: &str) -> Self {
        Self { recorder: Arc::new(Mutex::new(CassetteRecorder::new(path, name, commit))) }
    }

    /// Handle passed to each recording adapter.
    #[must_use]
    pub fn recorder(&self) -> SharedRecorder {
        Arc::clone(&self.recorder)
    }

    /// Writes the cassette. Every adapter holding the recorder must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if adapters still hold the recorder or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapters still hold the session recorder".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}
