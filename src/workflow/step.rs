//! Workflow steps, per-step status, and the transition table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SteerError};

/// A phase in the task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    Idle,
    Context,
    Prompt,
    Planning,
    Execution,
    Verification,
    Done,
    Suspended,
}

impl WorkflowStep {
    /// The five phases a round walks through, in order.
    pub const CANONICAL: [WorkflowStep; 5] =
        [Self::Context, Self::Prompt, Self::Planning, Self::Execution, Self::Verification];

    /// Steps that carry a status entry in [`TaskState::steps`](super::state::TaskState).
    pub const TRACKED: [WorkflowStep; 7] = [
        Self::Idle,
        Self::Context,
        Self::Prompt,
        Self::Planning,
        Self::Execution,
        Self::Verification,
        Self::Done,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Context => "CONTEXT",
            Self::Prompt => "PROMPT",
            Self::Planning => "PLANNING",
            Self::Execution => "EXECUTION",
            Self::Verification => "VERIFICATION",
            Self::Done => "DONE",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// One-based position within [`Self::CANONICAL`], or 0.
    #[must_use]
    pub fn step_number(self) -> u8 {
        Self::CANONICAL
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| u8::try_from(i + 1).unwrap_or(0))
    }

    /// Steps reachable from `self` in one transition.
    #[must_use]
    pub fn valid_targets(self) -> &'static [WorkflowStep] {
        use WorkflowStep::{Context, Done, Execution, Idle, Planning, Prompt, Suspended, Verification};
        match self {
            Idle => &[Context],
            Context => &[Prompt, Suspended],
            Prompt => &[Planning, Suspended],
            Planning => &[Execution, Suspended],
            Execution => &[Verification, Suspended],
            Verification => &[Done, Context],
            Done => &[Idle],
            Suspended => &[Context, Prompt, Planning, Execution, Verification],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: WorkflowStep) -> bool {
        self.valid_targets().contains(&to)
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `from -> to` against the transition table.
///
/// # Errors
///
/// Returns [`SteerError::InvalidTransition`] if the pair is not allowed.
pub fn validate_transition(from: WorkflowStep, to: WorkflowStep) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SteerError::InvalidTransition { from, to })
    }
}

/// Progress of a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Done,
    Failed,
    Skipped,
}

impl StepStatus {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Done => "✅",
            Self::Active => "🔄",
            Self::Pending => "⏳",
            Self::Failed => "❌",
            Self::Skipped => "⏭️",
        }
    }
}

/// Status and timing for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed time as `m:ss`, set when the step completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl StepRecord {
    /// A freshly activated step.
    #[must_use]
    pub fn active(at: DateTime<Utc>) -> Self {
        Self { status: StepStatus::Active, started_at: Some(at), ..Self::default() }
    }

    /// Marks the step done at `at`, recording its duration if it was started.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = StepStatus::Done;
        self.completed_at = Some(at);
        if let Some(started) = self.started_at {
            self.duration = Some(format_duration(started, at));
        }
    }
}

/// Formats the span between two instants as `m:ss`; negative spans are `0:00`.
#[must_use]
pub fn format_duration(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let secs = (to - from).num_seconds().max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}
