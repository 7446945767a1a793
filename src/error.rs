//! Error types for workflow, storage, and hook operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::hooks::HookResult;
use crate::workflow::step::WorkflowStep;

/// Result type for steer operations.
pub type Result<T> = std::result::Result<T, SteerError>;

/// Errors raised by the workflow engine and its collaborators.
///
/// Degraded data (missing git history, unresolved imports, absent
/// templates) never surfaces here; it is logged and the affected field
/// is omitted.
#[derive(Debug, Error)]
pub enum SteerError {
    /// The requested phase transition is not in the transition table.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Step the task was in.
        from: WorkflowStep,
        /// Step that was requested.
        to: WorkflowStep,
    },

    /// No persisted task snapshot exists.
    #[error("No active task. Start one with `steer start <mode> <input>`.")]
    NoActiveTask,

    /// The caller's state does not belong to the persisted task.
    #[error("Task mismatch: expected {expected}, found {found}")]
    TaskMismatch {
        /// Task id carried by the caller.
        expected: String,
        /// Task id in the persisted snapshot.
        found: String,
    },

    /// The task already reached DONE.
    #[error("Task {0} is already complete")]
    TaskComplete(String),

    /// A hook with `on_fail: block` failed.
    #[error("Blocked by {} hook: {}", .0.trigger, .0.message)]
    HookBlocked(Box<HookResult>),

    /// A port-level I/O failure.
    #[error("I/O error at {}: {message}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// A stored document could not be parsed.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse {
        /// Path of the malformed document.
        path: PathBuf,
        /// Parser error text.
        message: String,
    },

    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Invalid user-supplied configuration or arguments.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SteerError {
    /// Builds an [`SteerError::Io`] from a port error.
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Io { path: path.to_path_buf(), message: err.to_string() }
    }

    /// Builds a [`SteerError::Parse`] from a parser error.
    pub(crate) fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Parse { path: path.to_path_buf(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_both_steps() {
        let err =
            SteerError::InvalidTransition { from: WorkflowStep::Idle, to: WorkflowStep::Planning };
        assert_eq!(err.to_string(), "Invalid transition: IDLE -> PLANNING");
    }

    #[test]
    fn io_error_includes_path() {
        let err = SteerError::io(std::path::Path::new("/p/state.json"), "denied");
        assert!(err.to_string().contains("/p/state.json"));
        assert!(err.to_string().contains("denied"));
    }
}
