//! Human-readable summary of the persisted task.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::state::TaskState;
use super::step::{format_duration, StepStatus, WorkflowStep};

/// Formats `state` as of `now`; `None` renders the no-task message.
#[must_use]
pub fn format_status(state: Option<&TaskState>, now: DateTime<Utc>) -> String {
    let Some(state) = state else {
        return "No active task.".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Task: {} ({})", state.task_id, state.mode);
    let _ = writeln!(out, "Round: {} | Time: {}", state.round, state.elapsed(now));
    if let Some(step) = state.suspended_step {
        let _ = writeln!(out, "Suspended at: {step}");
    }
    out.push('\n');

    for step in WorkflowStep::CANONICAL {
        let record = state.steps.get(&step).cloned().unwrap_or_default();
        let duration = match (record.status, &record.duration, record.started_at) {
            (_, Some(d), _) => format!("  {d}"),
            (StepStatus::Active, None, Some(started)) => format!("  {}", format_duration(started, now)),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "  {}. {:<15} {}{duration}",
            step.step_number(),
            step.as_str(),
            record.status.icon()
        );
    }

    let mut hints = Vec::new();
    if let Some(tier) = &state.model_tier {
        hints.push(format!("Model: {tier} ({})", state.model_reason.as_deref().unwrap_or("default")));
    }
    if !state.sources_used.is_empty() {
        hints.push(format!("Sources: {}", state.sources_used.join(", ")));
    }
    if let Some(preview) = &state.impact_preview {
        hints.push(format!("Impact: {}", preview.risk_level));
    }
    if let Some(blocker) = &state.blocked_by {
        hints.push(format!("Blocked by {} hook: {}", blocker.trigger, blocker.message));
    }
    if !hints.is_empty() {
        out.push('\n');
        out.push_str(&hints.join("\n"));
        out.push('\n');
    }
    out.trim_end().to_string()
}
