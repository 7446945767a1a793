//! Recording adapter for the `ShellExecutor` port.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use super::SharedRecorder;
use crate::ports::shell::{ShellExecutor, ShellOutput};
use crate::ports::PortError;

/// Records hook commands and their outcomes.
pub struct RecordingShellExecutor {
    inner: Box<dyn ShellExecutor>,
    recorder: SharedRecorder,
}

impl RecordingShellExecutor {
    #[must_use]
    pub fn new(inner: Box<dyn ShellExecutor>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct RunInput<'a> {
    command: &'a str,
    cwd: String,
    timeout_secs: u64,
}

impl ShellExecutor for RecordingShellExecutor {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<ShellOutput, PortError> {
        let result = self.inner.run(command, cwd, timeout);
        let input = RunInput { command, cwd: cwd.display().to_string(), timeout_secs: timeout.as_secs() };
        let output = match &result {
            Ok(out) => json!({"ok": {
                "exit_code": out.exit_code,
                "stdout": out.stdout,
                "stderr": out.stderr,
                "timed_out": out.timed_out,
            }}),
            Err(e) => json!({"err": e.to_string()}),
        };
        let input = serde_json::to_value(&input).unwrap_or_default();
        self.recorder.lock().expect("recorder lock poisoned").record("shell", "run", input, output);
        result
    }
}
