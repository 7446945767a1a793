//! `steer hook` command: fire a trigger outside the phase operations.

use super::{format_hook_results, print_section};
use crate::context::ServiceContext;
use crate::hooks::{HookOutcome, HookTrigger};
use crate::paths::ProjectPaths;
use crate::workflow::engine::TriggerInput;
use crate::workflow::WorkflowEngine;

/// Execute the `hook` command.
///
/// # Errors
///
/// Returns an error string when a blocking hook fails.
pub fn run(ctx: &ServiceContext, paths: &ProjectPaths, trigger: HookTrigger, input: TriggerInput) -> Result<(), String> {
    let outcome = WorkflowEngine::new(ctx, paths).run_trigger(trigger, input);
    match outcome {
        HookOutcome::Completed(results) if results.is_empty() => {
            println!("No {trigger} hooks configured.");
            Ok(())
        }
        HookOutcome::Completed(results) => {
            print_section(&format!("{trigger} hooks:"), &format_hook_results(&results));
            Ok(())
        }
        HookOutcome::Blocked { completed, blocker } => {
            print_section(&format!("{trigger} hooks:"), &format_hook_results(&completed));
            Err(format!("Blocked by {trigger} hook: {}", blocker.message))
        }
    }
}
