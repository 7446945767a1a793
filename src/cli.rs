//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::hooks::HookTrigger;
use crate::workflow::TaskMode;

/// Top-level CLI parser for `steer`.
#[derive(Debug, Parser)]
#[command(name = "steer", version, about = "Resumable, codebase-aware task workflows")]
pub struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true, env = "STEER_ROOT")]
    pub root: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scaffold `.steer/` with config, rules, hooks, and templates.
    Init {
        /// Critical module path prefix (repeatable).
        #[arg(long = "critical", value_name = "PATH")]
        critical: Vec<String>,
        #[arg(long)]
        test_command: Option<String>,
        #[arg(long)]
        lint_command: Option<String>,
        /// Skip building the codebase map.
        #[arg(long)]
        no_map: bool,
        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },
    /// Build and save the codebase map.
    Map,
    /// Start a task and gather its context.
    Start {
        /// Task mode: bugfix, feature, refactor, design, or debug.
        mode: TaskMode,
        /// What the task is about; `@path` tokens mark files.
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },
    /// Gather context again for the active task (after a block or a failed round).
    Context {
        /// Replacement task description; the stored goal is reused when omitted.
        input: Vec<String>,
    },
    /// Answer questions and assemble the prompt.
    Prompt {
        /// `field=value` answer (repeatable).
        #[arg(long = "answer", value_name = "KEY=VALUE", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
    /// Record plan steps and preview their impact.
    Plan {
        /// Plan steps, in order.
        steps: Vec<String>,
    },
    /// Approve the plan and start execution.
    Approve,
    /// Mark execution complete.
    Complete,
    /// Report the verification result.
    Verify {
        #[arg(long, conflicts_with = "fail", required_unless_present = "fail")]
        pass: bool,
        #[arg(long)]
        fail: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Park the task at its current step.
    Suspend,
    /// Pick the last task back up.
    Resume,
    /// Clear a hook block and continue.
    Override,
    /// Show the current task.
    Status,
    /// Preview the impact of changing files, without touching the task.
    Impact {
        #[arg(required = true, num_args = 1..)]
        files: Vec<String>,
    },
    /// Run the hooks configured for a trigger.
    Hook {
        /// Trigger name, e.g. `post-commit`.
        trigger: HookTrigger,
        #[arg(long)]
        commit_message: Option<String>,
        #[arg(long)]
        pr_description: Option<String>,
        #[arg(long)]
        ticket: Option<String>,
        /// Conflicting pull request or branch (repeatable).
        #[arg(long = "conflict", value_name = "REF")]
        conflicts: Vec<String>,
    },
}

/// Parses `key=value`.
fn parse_answer(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::hooks::HookTrigger;
    use crate::workflow::TaskMode;
    use clap::Parser;

    #[test]
    fn parses_start_with_mode_and_input() {
        let cli = Cli::parse_from(["steer", "start", "bugfix", "fix", "@src/a.ts"]);
        let Command::Start { mode, input } = cli.command else {
            panic!("expected start");
        };
        assert_eq!(mode, TaskMode::Bugfix);
        assert_eq!(input, vec!["fix", "@src/a.ts"]);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["steer", "start", "chore", "x"]).is_err());
    }

    #[test]
    fn parses_repeated_answers() {
        let cli = Cli::parse_from(["steer", "prompt", "--answer", "goal=a=b", "--answer", "scope=src"]);
        let Command::Prompt { answers } = cli.command else {
            panic!("expected prompt");
        };
        assert_eq!(answers, vec![("goal".into(), "a=b".into()), ("scope".into(), "src".into())]);
        assert!(Cli::try_parse_from(["steer", "prompt", "--answer", "novalue"]).is_err());
    }

    #[test]
    fn verify_requires_exactly_one_verdict() {
        assert!(Cli::try_parse_from(["steer", "verify"]).is_err());
        assert!(Cli::try_parse_from(["steer", "verify", "--pass", "--fail"]).is_err());
        let cli = Cli::parse_from(["steer", "verify", "--fail", "--notes", "flaky"]);
        assert!(matches!(cli.command, Command::Verify { pass: false, fail: true, .. }));
    }

    #[test]
    fn context_input_is_optional() {
        let cli = Cli::parse_from(["steer", "context"]);
        assert!(matches!(cli.command, Command::Context { ref input } if input.is_empty()));
        let cli = Cli::parse_from(["steer", "context", "retry", "@src/a.ts"]);
        assert!(matches!(cli.command, Command::Context { ref input } if input.len() == 2));
    }

    #[test]
    fn hook_collects_repeated_conflicts() {
        let cli = Cli::parse_from(["steer", "hook", "post-pr", "--conflict", "#41", "--conflict", "feature/x"]);
        let Command::Hook { trigger, conflicts, .. } = cli.command else {
            panic!("expected hook");
        };
        assert_eq!(trigger, HookTrigger::PostPr);
        assert_eq!(conflicts, vec!["#41", "feature/x"]);
    }

    #[test]
    fn parses_hook_trigger_and_global_root() {
        let cli = Cli::parse_from(["steer", "hook", "post-commit", "--root", "/tmp/p", "-v"]);
        assert!(matches!(cli.command, Command::Hook { trigger: HookTrigger::PostCommit, .. }));
        assert_eq!(cli.root.as_deref(), Some(std::path::Path::new("/tmp/p")));
        assert!(cli.verbose);
    }
}
