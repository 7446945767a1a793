//! Replaying adapter for the `ShellExecutor` port.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::next_output;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::shell::{ShellExecutor, ShellOutput};
use crate::ports::PortError;

/// Replays recorded shell command results from a cassette.
pub struct ReplayingShellExecutor {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingShellExecutor {
    /// Creates a new replaying shell executor from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl ShellExecutor for ReplayingShellExecutor {
    fn run(&self, _command: &str, _cwd: &Path, _timeout: Duration) -> Result<ShellOutput, PortError> {
        let output = next_output(&self.replayer, "shell", "run");
        if let Some(err) = output.get("err") {
            let msg = err.as_str().unwrap_or("unknown error").to_string();
            return Err(msg.into());
        }
        let value = output.get("ok").unwrap_or(&output);
        let exit_code = value.get("exit_code").and_then(Value::as_i64).unwrap_or(0);
        let text = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        Ok(ShellOutput {
            exit_code: i32::try_from(exit_code).unwrap_or(1),
            stdout: text("stdout"),
            stderr: text("stderr"),
            timed_out: value.get("timed_out").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}
