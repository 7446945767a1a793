//! Executes hook definitions for a trigger.

use std::path::Path;
use std::time::Duration;

use super::checks::CheckKind;
use super::{
    HookAction, HookContext, HookDefinition, HookOutcome, HookResult, HookStatus, HookTrigger,
    OnFail,
};
use crate::context::ServiceContext;

/// Default timeout for `run` hooks (test and lint commands).
pub const HOOK_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum characters of command output kept in a failure message.
const OUTPUT_LIMIT: usize = 500;

/// Runs every definition for `trigger`, in order.
///
/// Stops at the first failing hook whose policy is `block` and returns
/// [`HookOutcome::Blocked`]; otherwise returns all results.
#[must_use]
pub fn run_hooks(
    ctx: &ServiceContext,
    cwd: &Path,
    trigger: HookTrigger,
    definitions: &[HookDefinition],
    snapshot: &HookContext,
) -> HookOutcome {
    let mut completed = Vec::new();
    for def in definitions.iter().filter(|d| d.trigger == trigger) {
        let result = match &def.action {
            HookAction::Check(name) => evaluate_check(def, name, snapshot),
            HookAction::Run(command) => run_command(ctx, cwd, def, &snapshot.expand_command(command)),
        };
        if result.result == HookStatus::Fail {
            if def.on_fail == OnFail::Block {
                tracing::info!(%trigger, hook = result.label(), "Hook blocked workflow");
                return HookOutcome::Blocked { completed, blocker: result };
            }
            tracing::warn!(%trigger, hook = result.label(), message = %result.message, "Hook failed");
        }
        completed.push(result);
    }
    HookOutcome::Completed(completed)
}

fn failed_status(on_fail: OnFail) -> HookStatus {
    if on_fail == OnFail::Skip {
        HookStatus::Skip
    } else {
        HookStatus::Fail
    }
}

fn evaluate_check(def: &HookDefinition, name: &str, snapshot: &HookContext) -> HookResult {
    let kind = CheckKind::parse(name);
    let (result, message) = match kind.evaluate(snapshot, def.files.as_deref()) {
        Some(true) => (HookStatus::Pass, String::new()),
        Some(false) => (failed_status(def.on_fail), def.message.clone()),
        None => (HookStatus::Skip, format!("Unknown check: {name}")),
    };
    HookResult { trigger: def.trigger, check: Some(name.to_string()), run: None, result, message }
}

fn run_command(ctx: &ServiceContext, cwd: &Path, def: &HookDefinition, command: &str) -> HookResult {
    let timeout = def.timeout_secs.map_or(HOOK_TIMEOUT, Duration::from_secs);
    let reason = match ctx.shell.run(command, cwd, timeout) {
        Ok(out) if out.success() => None,
        Ok(out) if out.timed_out => Some(format!("timed out after {}s", timeout.as_secs())),
        Ok(out) => {
            let text = if out.stderr.trim().is_empty() { &out.stdout } else { &out.stderr };
            let text = truncate(text.trim(), OUTPUT_LIMIT);
            if text.is_empty() {
                Some(format!("exit {}", out.exit_code))
            } else {
                Some(format!("exit {}: {text}", out.exit_code))
            }
        }
        Err(e) => Some(e.to_string()),
    };
    let (result, message) = match reason {
        None => (HookStatus::Pass, String::new()),
        Some(reason) => (failed_status(def.on_fail), format!("{} ({reason})", def.message)),
    };
    HookResult { trigger: def.trigger, check: None, run: Some(command.to_string()), result, message }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push('…');
    cut
}
