//! Shell executor port for hook commands.

use std::path::Path;
use std::time::Duration;

use super::PortError;

/// The output of a shell command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code of the process; `124` when it was killed at its timeout.
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
    /// Whether the process was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl ShellOutput {
    /// Returns `true` if the command exited with status 0 in time.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Executes shell commands with a bounded runtime.
pub trait ShellExecutor: Send + Sync {
    /// Runs `command` through `sh -c` inside `cwd`, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<ShellOutput, PortError>;
}
