//! The task aggregate and the records derived from it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::{format_duration, validate_transition, StepRecord, StepStatus, WorkflowStep};
use crate::error::{Result, SteerError};
use crate::hooks::HookResult;
use crate::impact::{ImpactPreview, RiskLevel};

/// The intent of a task; selects its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Bugfix,
    Feature,
    Refactor,
    Design,
    Debug,
}

impl TaskMode {
    pub const ALL: [TaskMode; 5] = [Self::Bugfix, Self::Feature, Self::Refactor, Self::Design, Self::Debug];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bugfix => "bugfix",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Design => "design",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str() == s).ok_or_else(|| {
            let modes: Vec<&str> = Self::ALL.into_iter().map(TaskMode::as_str).collect();
            format!("unknown mode '{s}' (expected one of: {})", modes.join(", "))
        })
    }
}

/// The context bag gathered for a task and filled in by answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repro_steps: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<String>,
    /// Ticket id, from a `ticket` or `jira_ticket` answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codemap_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar_tasks: Vec<SimilarTask>,
    /// Every raw answer, by field name.
    pub answers: BTreeMap<String, String>,
}

/// A past task resembling the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTask {
    pub task_id: String,
    pub mode: TaskMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub rounds: u32,
    pub total_time: String,
    pub score: u32,
}

/// A follow-up question for a missing template field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Field name the answer fills.
    pub id: String,
    pub question: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Mutable state of one task, persisted after every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub task_id: String,
    pub mode: TaskMode,
    pub round: u32,
    pub started_at: DateTime<Utc>,
    pub current_step: WorkflowStep,
    pub step_number: u8,
    pub steps: BTreeMap<WorkflowStep, StepRecord>,
    /// Context-source tags, without duplicates, in first-use order.
    pub sources_used: Vec<String>,
    /// Files in scope, without duplicates.
    pub files: Vec<String>,
    #[serde(default)]
    pub context: TaskContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_preview: Option<ImpactPreview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_plan: Option<Vec<String>>,
    #[serde(default)]
    pub completed_plan_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembled_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_step: Option<WorkflowStep>,
    /// A blocking hook failure that must be cleared before moving on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<HookResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_reason: Option<String>,
    /// Verification notes, one per verify call that supplied them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub resumable: bool,
    #[serde(default)]
    pub resumed: bool,
    #[serde(default)]
    pub override_used: bool,
}

impl TaskState {
    /// A fresh task at IDLE, with IDLE already marked done.
    #[must_use]
    pub fn new(task_id: String, mode: TaskMode, now: DateTime<Utc>) -> Self {
        let mut steps: BTreeMap<WorkflowStep, StepRecord> =
            WorkflowStep::TRACKED.iter().map(|s| (*s, StepRecord::default())).collect();
        steps.insert(
            WorkflowStep::Idle,
            StepRecord { status: StepStatus::Done, completed_at: Some(now), ..StepRecord::default() },
        );
        Self {
            task_id,
            mode,
            round: 1,
            started_at: now,
            current_step: WorkflowStep::Idle,
            step_number: 0,
            steps,
            sources_used: Vec::new(),
            files: Vec::new(),
            context: TaskContext::default(),
            impact_preview: None,
            approved_plan: None,
            completed_plan_steps: Vec::new(),
            assembled_prompt: None,
            suspended_step: None,
            blocked_by: None,
            model_tier: None,
            model_reason: None,
            notes: Vec::new(),
            resumable: false,
            resumed: false,
            override_used: false,
        }
    }

    /// Moves to `to`: completes the active step and activates the target.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SteerError::InvalidTransition`] and leaves the
    /// state untouched when the move is not in the transition table.
    pub fn transition(&mut self, to: WorkflowStep, now: DateTime<Utc>) -> Result<()> {
        validate_transition(self.current_step, to)?;
        if let Some(current) = self.steps.get_mut(&self.current_step) {
            if current.status == StepStatus::Active {
                current.complete(now);
            }
        }
        if to == WorkflowStep::Done {
            self.steps.insert(
                to,
                StepRecord { status: StepStatus::Done, completed_at: Some(now), ..StepRecord::default() },
            );
        } else if self.steps.contains_key(&to) {
            self.steps.insert(to, StepRecord::active(now));
        }
        self.current_step = to;
        self.step_number = to.step_number();
        self.resumable = true;
        Ok(())
    }

    /// Parks the task; the current step keeps its active entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the current step cannot be suspended.
    pub fn suspend(&mut self) -> Result<()> {
        validate_transition(self.current_step, WorkflowStep::Suspended)?;
        self.suspended_step = Some(self.current_step);
        self.current_step = WorkflowStep::Suspended;
        self.step_number = 0;
        self.resumable = true;
        Ok(())
    }

    /// Returns a suspended task to the step it was parked at.
    ///
    /// # Errors
    ///
    /// Returns an error when the recorded step is not a valid resume target.
    pub fn resume(&mut self) -> Result<WorkflowStep> {
        let Some(step) = self.suspended_step else {
            return Ok(self.current_step);
        };
        validate_transition(self.current_step, step)?;
        self.current_step = step;
        self.step_number = step.step_number();
        self.suspended_step = None;
        self.resumed = true;
        Ok(step)
    }

    /// Starts the next round after a failed verification: every phase goes
    /// back to pending and CONTEXT is re-activated.
    ///
    /// # Errors
    ///
    /// Returns an error unless the task is in VERIFICATION.
    pub fn start_next_round(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.current_step != WorkflowStep::Verification {
            return Err(SteerError::InvalidTransition { from: self.current_step, to: WorkflowStep::Context });
        }
        self.round += 1;
        for step in WorkflowStep::CANONICAL {
            self.steps.insert(step, StepRecord::default());
        }
        self.steps.insert(WorkflowStep::Context, StepRecord::active(now));
        self.current_step = WorkflowStep::Context;
        self.step_number = WorkflowStep::Context.step_number();
        self.approved_plan = None;
        self.completed_plan_steps.clear();
        self.blocked_by = None;
        Ok(())
    }

    /// Records a context source once.
    pub fn add_source(&mut self, tag: &str) {
        if !self.sources_used.iter().any(|s| s == tag) {
            self.sources_used.push(tag.to_string());
        }
    }

    /// Replaces the files in scope, dropping duplicates.
    pub fn set_files(&mut self, files: impl IntoIterator<Item = String>) {
        self.files.clear();
        for file in files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
    }

    /// Steps currently marked active.
    #[must_use]
    pub fn active_steps(&self) -> Vec<WorkflowStep> {
        self.steps.iter().filter(|(_, r)| r.status == StepStatus::Active).map(|(s, _)| *s).collect()
    }

    /// Elapsed time since creation as `m:ss`.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> String {
        format_duration(self.started_at, now)
    }
}

/// Immutable record appended to history when a task reaches DONE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHistoryEntry {
    pub task_id: String,
    pub mode: TaskMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub rounds: u32,
    pub total_time: String,
    /// Duration of each completed step, keyed by step name.
    pub time_per_step: BTreeMap<String, String>,
    pub sources_used: Vec<String>,
    pub files_changed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default)]
    pub completed_first_round: bool,
    #[serde(default)]
    pub override_used: bool,
    #[serde(default)]
    pub resumed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl TaskHistoryEntry {
    /// Summarises a finished task.
    #[must_use]
    pub fn from_state(state: &TaskState, now: DateTime<Utc>) -> Self {
        let time_per_step = state
            .steps
            .iter()
            .filter_map(|(step, record)| record.duration.clone().map(|d| (step.to_string(), d)))
            .collect();
        Self {
            task_id: state.task_id.clone(),
            mode: state.mode,
            goal: state.context.goal.clone(),
            rounds: state.round,
            total_time: state.elapsed(now),
            time_per_step,
            sources_used: state.sources_used.clone(),
            files_changed: state.files.clone(),
            risk_level: state.impact_preview.as_ref().map(|p| p.risk_level),
            model_used: state.model_tier.clone(),
            completed_first_round: state.round == 1,
            override_used: state.override_used,
            resumed: state.resumed,
            notes: state.notes.clone(),
            completed_at: now,
        }
    }
}
