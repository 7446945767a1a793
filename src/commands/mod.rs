//! Command dispatch and handlers.
//!
//! Handlers load what they need through the service context, call one
//! library operation, and print the result. Nothing here holds workflow
//! logic.

pub mod hook;
pub mod impact;
pub mod init;
pub mod map;
pub mod status;
pub mod task;

use std::env;
use std::path::{Path, PathBuf};

use crate::adapters::live::git::LiveGitRepo;
use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::context::ServiceContext;
use crate::hooks::HookResult;
use crate::paths::ProjectPaths;
use crate::ports::git::GitRepo;

/// Dispatch a parsed command to its handler.
///
/// When `STEER_RECORD` is set to a file path, every port interaction is
/// recorded to a cassette at that path.
///
/// # Errors
///
/// Returns an error string if the project root cannot be resolved or the
/// selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => env::current_dir().map_err(|e| format!("failed to get current directory: {e}"))?,
    };
    let paths = ProjectPaths::new(&root);

    let Ok(cassette) = env::var("STEER_RECORD") else {
        return dispatch_with_context(&cli.command, &ServiceContext::live(), &paths);
    };

    let commit = LiveGitRepo.current_commit(&root).unwrap_or_else(|_| "unknown".to_string());
    let session = RecordingSession::new(&PathBuf::from(cassette), "steer-session", &commit);
    let ctx = ServiceContext::recording(&session);
    let result = dispatch_with_context(&cli.command, &ctx, &paths);

    // Adapters hold the recorder; release them before writing.
    drop(ctx);
    let written = session.finish()?;
    eprintln!("Recording saved to: {}", written.display());
    result
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(command: &Command, ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    match command {
        Command::Init { critical, test_command, lint_command, no_map, force } => {
            let options = crate::workflow::defaults::InitOptions {
                critical_modules: critical.clone(),
                test_command: test_command.clone(),
                lint_command: lint_command.clone(),
                force: *force,
            };
            init::run(ctx, paths, &options, !*no_map)
        }
        Command::Map => map::run(ctx, paths),
        Command::Start { mode, input } => task::start(ctx, paths, *mode, &input.join(" ")),
        Command::Context { input } => task::context(ctx, paths, &input.join(" ")),
        Command::Prompt { answers } => task::prompt(ctx, paths, answers),
        Command::Plan { steps } => task::plan(ctx, paths, steps),
        Command::Approve => task::approve(ctx, paths),
        Command::Complete => task::complete(ctx, paths),
        Command::Verify { pass, notes, .. } => task::verify(ctx, paths, *pass, notes.as_deref()),
        Command::Suspend => task::suspend(ctx, paths),
        Command::Resume => task::resume(ctx, paths),
        Command::Override => task::override_block(ctx, paths),
        Command::Status => status::run(ctx, paths),
        Command::Impact { files } => impact::run(ctx, paths, files),
        Command::Hook { trigger, commit_message, pr_description, ticket, conflicts } => {
            let input = crate::workflow::engine::TriggerInput {
                commit_message: commit_message.clone(),
                pr_description: pr_description.clone(),
                ticket: ticket.clone(),
                open_conflicts: conflicts.clone(),
            };
            hook::run(ctx, paths, *trigger, input)
        }
    }
}

/// One line per hook result: `[fail] pre-plan critical_file_guard: message`.
pub(crate) fn format_hook_results(results: &[HookResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| {
            let mut line = format!("[{}] {} {}", r.result.as_str(), r.trigger, r.label());
            if !r.message.is_empty() {
                line.push_str(": ");
                line.push_str(&r.message);
            }
            line
        })
        .collect()
}

/// Prints `heading` followed by indented `lines`, unless there are none.
pub(crate) fn print_section(heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!("{heading}");
    for line in lines {
        println!("  {line}");
    }
}

/// Relative display of `path` under `root`, for init output.
pub(crate) fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
