//! Task lifecycle commands: `start` through `override`.

use std::collections::BTreeMap;

use super::{format_hook_results, print_section};
use crate::context::ServiceContext;
use crate::error::SteerError;
use crate::impact::ImpactPreview;
use crate::paths::ProjectPaths;
use crate::store::TaskStore;
use crate::workflow::engine::GatherOutcome;
use crate::workflow::state::TaskState;
use crate::workflow::{TaskMode, WorkflowEngine};

/// Loads the persisted task or fails with [`SteerError::NoActiveTask`].
fn current_task(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<TaskState, String> {
    TaskStore::new(ctx, paths)
        .read_current_task()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| SteerError::NoActiveTask.to_string())
}

/// Turns a block into an error with a hint.
fn explain(err: SteerError) -> String {
    match err {
        SteerError::HookBlocked(_) => format!("{err}\nResolve it, or run `steer override` to continue."),
        other => other.to_string(),
    }
}

fn step_line(state: &TaskState) -> String {
    format!("Step: {} ({}/5) | Round {}", state.current_step, state.step_number, state.round)
}

/// `steer start <mode> <input…>`
///
/// # Errors
///
/// Returns an error string if the task cannot be created or gathered.
pub fn start(ctx: &ServiceContext, paths: &ProjectPaths, mode: TaskMode, input: &str) -> Result<(), String> {
    let engine = WorkflowEngine::new(ctx, paths);
    let state = engine.create_task(mode).map_err(explain)?;
    let out = engine.gather_context(&state, input).map_err(explain)?;
    println!("Started task {} ({mode})", out.state.task_id);
    print_gathered(&out);
    Ok(())
}

/// `steer context [input…]`: gathers context again for the active task.
///
/// # Errors
///
/// Returns an error string if there is no task or it is past CONTEXT.
pub fn context(ctx: &ServiceContext, paths: &ProjectPaths, input: &str) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let input = if input.trim().is_empty() { state.context.goal.clone().unwrap_or_default() } else { input.to_string() };
    let out = WorkflowEngine::new(ctx, paths).gather_context(&state, &input).map_err(explain)?;
    println!("Gathered context for task {} ({})", out.state.task_id, out.state.mode);
    print_gathered(&out);
    Ok(())
}

fn print_gathered(out: &GatherOutcome) {
    let state = &out.state;
    println!("{}", step_line(state));
    if !state.files.is_empty() {
        println!("Files: {}", state.files.join(", "));
    }
    if out.template.is_none() {
        println!("No template for {}; the prompt will use the default layout.", state.mode);
    }

    let questions: Vec<String> = out
        .questions
        .iter()
        .map(|q| match &q.context {
            Some(context) => format!("[{}] {}\n    {context}", q.id, q.question),
            None => format!("[{}] {}", q.id, q.question),
        })
        .collect();
    print_section("Questions:", &questions);

    let similar: Vec<String> = state
        .context
        .similar_tasks
        .iter()
        .map(|t| {
            let goal = t.goal.as_deref().unwrap_or("-");
            format!("{} ({}, {} round(s), {}) score {}: {goal}", t.task_id, t.mode, t.rounds, t.total_time, t.score)
        })
        .collect();
    print_section("Similar tasks:", &similar);
    print_section("Hooks:", &format_hook_results(&out.hook_results));

    if let Some(blocker) = &state.blocked_by {
        println!("Blocked by {} hook: {}", blocker.trigger, blocker.message);
        println!("Resolve it and run `steer context`, or run `steer override`.");
    }
}

/// `steer prompt [--answer key=value]…`
///
/// # Errors
///
/// Returns an error string if there is no task or the step is refused.
pub fn prompt(ctx: &ServiceContext, paths: &ProjectPaths, answers: &[(String, String)]) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let answers: BTreeMap<String, String> = answers.iter().cloned().collect();
    let out = WorkflowEngine::new(ctx, paths).build_prompt_step(&state, &answers).map_err(explain)?;
    println!("{}", step_line(&out.state));
    println!();
    println!("{}", out.assembled_prompt);
    Ok(())
}

pub(crate) fn format_impact(preview: &ImpactPreview) -> Vec<String> {
    let mut lines = vec![format!("Risk: {}", preview.risk_level)];
    lines.push(format!("Files: {}", preview.files_modified.join(", ")));
    if !preview.downstream.is_empty() {
        lines.push(format!("Downstream: {}", preview.downstream.join(", ")));
    }
    if !preview.tests_to_run.is_empty() {
        lines.push(format!("Tests to run: {}", preview.tests_to_run.join(", ")));
    }
    for candidate in preview.change_coupling.iter().flatten() {
        let scope = if candidate.in_scope { "in scope" } else { "not in scope" };
        lines.push(format!(
            "Changes with {}: {} ({:.0}%, {scope})",
            candidate.source,
            candidate.file,
            candidate.coupling * 100.0
        ));
    }
    lines
}

/// `steer plan <step>…`
///
/// # Errors
///
/// Returns an error string if there is no task or the step is refused.
pub fn plan(ctx: &ServiceContext, paths: &ProjectPaths, steps: &[String]) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let out = WorkflowEngine::new(ctx, paths).create_plan(&state, steps).map_err(explain)?;
    println!("Plan recorded ({} step(s)).", steps.len());
    println!("{}", step_line(&out.state));
    if let Some(preview) = &out.impact_preview {
        print_section("Impact:", &format_impact(preview));
    }
    if let Some(tier) = &out.state.model_tier {
        println!("Model: {tier} ({})", out.state.model_reason.as_deref().unwrap_or("default"));
    }
    print_section("Hooks:", &format_hook_results(&out.hook_results));
    if let Some(blocker) = &out.state.blocked_by {
        println!("Blocked by {} hook: {}", blocker.trigger, blocker.message);
        println!("Approval is held until you run `steer override`.");
    }
    Ok(())
}

/// `steer approve`
///
/// # Errors
///
/// Returns an error string if there is no task, the step is refused, or a hook blocks.
pub fn approve(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let next = WorkflowEngine::new(ctx, paths).approve_plan(&state).map_err(explain)?;
    println!("Plan approved.");
    println!("{}", step_line(&next));
    Ok(())
}

/// `steer complete`
///
/// # Errors
///
/// Returns an error string if there is no task or the step is refused.
pub fn complete(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let next = WorkflowEngine::new(ctx, paths).complete_execution(&state).map_err(explain)?;
    println!("Execution complete.");
    println!("{}", step_line(&next));
    Ok(())
}

/// `steer verify --pass|--fail [--notes N]`
///
/// # Errors
///
/// Returns an error string if there is no task, it is finished, or a hook blocks.
pub fn verify(ctx: &ServiceContext, paths: &ProjectPaths, passed: bool, notes: Option<&str>) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let out = WorkflowEngine::new(ctx, paths).verify(&state, passed, notes).map_err(explain)?;
    match &out.history_entry {
        Some(entry) => println!(
            "Task {} complete: {} round(s), {} total.",
            entry.task_id, entry.rounds, entry.total_time
        ),
        None => {
            println!("Verification failed. Starting round {}.", out.state.round);
            println!("{}", step_line(&out.state));
        }
    }
    Ok(())
}

/// `steer suspend`
///
/// # Errors
///
/// Returns an error string if there is no task or its step cannot be suspended.
pub fn suspend(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let next = WorkflowEngine::new(ctx, paths).suspend_task(&state).map_err(explain)?;
    let at = next.suspended_step.unwrap_or(next.current_step);
    println!("Task {} suspended at {at}. Run `steer resume` to continue.", next.task_id);
    Ok(())
}

/// `steer resume`
///
/// # Errors
///
/// Returns an error string if the snapshot cannot be read or written.
pub fn resume(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let out = WorkflowEngine::new(ctx, paths).resume_task().map_err(explain)?;
    println!("{}", out.message);
    Ok(())
}

/// `steer override`
///
/// # Errors
///
/// Returns an error string if there is no task.
pub fn override_block(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let state = current_task(ctx, paths)?;
    let (_, cleared) = WorkflowEngine::new(ctx, paths).override_block(&state).map_err(explain)?;
    match cleared {
        Some(blocker) => println!("Override applied to {} hook: {}", blocker.trigger, blocker.message),
        None => println!("No hook block to override."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cassette, project_context, ManualClock};
    use crate::workflow::defaults::{scaffold, InitOptions};
    use crate::workflow::WorkflowStep;

    fn project() -> (tempfile::TempDir, ServiceContext, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = project_context(&ManualClock::at("2025-03-01T09:00:00Z"), &cassette(vec![]));
        let paths = ProjectPaths::new(dir.path());
        scaffold(&ctx, &paths, &InitOptions::default()).unwrap();
        std::fs::write(paths.hooks(), "hooks: {}\n").unwrap();
        (dir, ctx, paths)
    }

    #[test]
    fn commands_walk_a_task_to_done() {
        let (_dir, ctx, paths) = project();
        start(&ctx, &paths, TaskMode::Feature, "Add CSV export").unwrap();
        prompt(&ctx, &paths, &[("user_story".into(), "As a user I export".into())]).unwrap();
        plan(&ctx, &paths, &["Add exporter".into()]).unwrap();
        approve(&ctx, &paths).unwrap();
        complete(&ctx, &paths).unwrap();
        verify(&ctx, &paths, true, None).unwrap();

        let state = current_task(&ctx, &paths).unwrap();
        assert_eq!(state.current_step, WorkflowStep::Done);
        assert_eq!(TaskStore::new(&ctx, &paths).read_history().unwrap().len(), 1);
    }

    #[test]
    fn commands_without_a_task_fail_with_hint() {
        let (_dir, ctx, paths) = project();
        let err = approve(&ctx, &paths).unwrap_err();
        assert!(err.starts_with("No active task"));
    }

    #[test]
    fn out_of_order_command_names_both_steps() {
        let (_dir, ctx, paths) = project();
        start(&ctx, &paths, TaskMode::Bugfix, "Fix it").unwrap();
        let err = complete(&ctx, &paths).unwrap_err();
        assert_eq!(err, "Invalid transition: CONTEXT -> VERIFICATION");
    }

    #[test]
    fn context_retries_a_blocked_task_in_place() {
        let (_dir, ctx, paths) = project();
        std::fs::write(
            paths.hooks(),
            "hooks:\n  pre-context:\n    - check: template_exists\n      on_fail: block\n      message: Add a template\n",
        )
        .unwrap();
        let template = paths.template("debug");
        let contents = std::fs::read_to_string(&template).unwrap();
        std::fs::remove_file(&template).unwrap();

        start(&ctx, &paths, TaskMode::Debug, "Crash on boot").unwrap();
        let blocked = current_task(&ctx, &paths).unwrap();
        assert!(blocked.blocked_by.is_some());
        assert!(prompt(&ctx, &paths, &[]).unwrap_err().starts_with("Blocked by pre-context hook: Add a template"));

        std::fs::write(&template, contents).unwrap();
        context(&ctx, &paths, "").unwrap();
        let retried = current_task(&ctx, &paths).unwrap();
        assert_eq!(retried.task_id, blocked.task_id);
        assert_eq!(retried.context.goal.as_deref(), Some("Crash on boot"));
        assert!(retried.blocked_by.is_none());

        prompt(&ctx, &paths, &[]).unwrap();
        assert_eq!(current_task(&ctx, &paths).unwrap().current_step, WorkflowStep::Prompt);
    }

    #[test]
    fn context_is_refused_past_the_context_step() {
        let (_dir, ctx, paths) = project();
        start(&ctx, &paths, TaskMode::Feature, "Add CSV export").unwrap();
        prompt(&ctx, &paths, &[]).unwrap();
        assert_eq!(context(&ctx, &paths, "").unwrap_err(), "Invalid transition: PROMPT -> CONTEXT");
    }
}
