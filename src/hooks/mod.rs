//! Hook engine: gates evaluated at workflow phase boundaries.
//!
//! Hooks are declared in `.steer/hooks.yaml`, grouped by trigger:
//!
//! ```yaml
//! hooks:
//!   pre-plan:
//!     - check: critical_file_guard
//!       on_fail: block
//!       message: "Touching critical module."
//!   post-execute:
//!     - run: "{test_command}"
//!       on_fail: warn
//!       timeout: 300
//!       message: "Tests failed."
//! ```
//!
//! A `check` is a named in-memory predicate; a `run` is a shell command
//! executed with a timeout (60 s unless `timeout` gives seconds).
//! `{test_command}` and `{lint_command}` in a command expand to the
//! configured project commands. Running hooks never errors: failures become
//! [`HookResult`]s, and a failure under `on_fail: block` ends evaluation
//! with [`HookOutcome::Blocked`].

pub mod checks;
pub mod runner;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::paths::ProjectPaths;

pub use runner::run_hooks;

/// Named phase-boundary events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookTrigger {
    PreContext,
    PostContext,
    PrePlan,
    PostPlan,
    PreExecute,
    PostExecute,
    PreVerify,
    PostVerify,
    PostCommit,
    PostPr,
}

impl HookTrigger {
    /// Every trigger, in workflow order.
    pub const ALL: [HookTrigger; 10] = [
        Self::PreContext,
        Self::PostContext,
        Self::PrePlan,
        Self::PostPlan,
        Self::PreExecute,
        Self::PostExecute,
        Self::PreVerify,
        Self::PostVerify,
        Self::PostCommit,
        Self::PostPr,
    ];

    /// The kebab-case name used in `hooks.yaml`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreContext => "pre-context",
            Self::PostContext => "post-context",
            Self::PrePlan => "pre-plan",
            Self::PostPlan => "post-plan",
            Self::PreExecute => "pre-execute",
            Self::PostExecute => "post-execute",
            Self::PreVerify => "pre-verify",
            Self::PostVerify => "post-verify",
            Self::PostCommit => "post-commit",
            Self::PostPr => "post-pr",
        }
    }
}

impl fmt::Display for HookTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown hook trigger: {s}"))
    }
}

/// What to do when a hook does not pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFail {
    /// Halt and surface to the caller.
    Block,
    /// Record and continue.
    Warn,
    /// Record as skipped and continue.
    #[default]
    Skip,
}

/// The body of a hook: a named predicate or a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// A built-in check, by name.
    Check(String),
    /// A shell command run in the project root.
    Run(String),
}

/// One parsed hook definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDefinition {
    pub trigger: HookTrigger,
    pub action: HookAction,
    pub on_fail: OnFail,
    pub message: String,
    /// Path prefixes overriding the critical modules for `critical_file_guard`.
    pub files: Option<Vec<String>>,
    /// Seconds before a `run` command is killed.
    pub timeout_secs: Option<u64>,
}

/// Outcome of a single hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookStatus {
    Pass,
    Fail,
    Skip,
}

impl HookStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

/// Recorded result of evaluating one hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResult {
    pub trigger: HookTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    pub result: HookStatus,
    pub message: String,
}

impl HookResult {
    /// Short label: the check name or the command.
    #[must_use]
    pub fn label(&self) -> &str {
        self.check.as_deref().or(self.run.as_deref()).unwrap_or("hook")
    }
}

/// Result of running all hooks for one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Every matching hook ran.
    Completed(Vec<HookResult>),
    /// A `block` hook failed; later hooks were not evaluated.
    Blocked {
        /// Results of the hooks evaluated before the blocker.
        completed: Vec<HookResult>,
        /// The failing blocking hook.
        blocker: HookResult,
    },
}

impl HookOutcome {
    /// The blocking result, if evaluation was halted.
    #[must_use]
    pub fn blocker(&self) -> Option<&HookResult> {
        match self {
            Self::Completed(_) => None,
            Self::Blocked { blocker, .. } => Some(blocker),
        }
    }

    /// All results in evaluation order, blocker last.
    #[must_use]
    pub fn into_results(self) -> Vec<HookResult> {
        match self {
            Self::Completed(results) => results,
            Self::Blocked { mut completed, blocker } => {
                completed.push(blocker);
                completed
            }
        }
    }
}

/// In-memory snapshot that checks are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookContext {
    pub template_loaded: bool,
    pub ticket: Option<String>,
    pub files: Vec<String>,
    pub critical_modules: Vec<String>,
    /// Open pull requests or branches that conflict with this work.
    pub open_conflicts: Vec<String>,
    pub commit_message: Option<String>,
    pub pr_description: Option<String>,
    pub test_command: Option<String>,
    pub lint_command: Option<String>,
}

impl HookContext {
    /// Expands `{test_command}` and `{lint_command}` in a hook command.
    #[must_use]
    pub fn expand_command(&self, command: &str) -> String {
        let mut expanded = command.to_string();
        for (key, value) in [("{test_command}", &self.test_command), ("{lint_command}", &self.lint_command)] {
            if let Some(value) = value {
                expanded = expanded.replace(key, value);
            }
        }
        expanded
    }
}

#[derive(Debug, Default, Deserialize)]
struct HooksFile {
    #[serde(default)]
    hooks: BTreeMap<String, Option<Vec<RawHook>>>,
}

#[derive(Debug, Deserialize)]
struct RawHook {
    check: Option<String>,
    run: Option<String>,
    #[serde(default)]
    on_fail: OnFail,
    #[serde(default)]
    message: String,
    files: Option<Vec<String>>,
    timeout: Option<u64>,
}

/// Parses `hooks.yaml` text into definitions, grouped by trigger in
/// workflow order and in file order within a trigger.
///
/// Unknown triggers and entries with neither `check` nor `run` are skipped.
///
/// # Errors
///
/// Returns an error if the text is not valid YAML of the expected shape.
pub fn parse_hooks(yaml: &str) -> Result<Vec<HookDefinition>, serde_yaml::Error> {
    let file: HooksFile = if yaml.trim().is_empty() {
        HooksFile::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    let mut definitions = Vec::new();
    let mut groups: Vec<(HookTrigger, Vec<RawHook>)> = Vec::new();
    for (name, entries) in file.hooks {
        match name.parse::<HookTrigger>() {
            Ok(trigger) => groups.push((trigger, entries.unwrap_or_default())),
            Err(e) => tracing::warn!(trigger = %name, error = %e, "Ignoring hooks for unknown trigger"),
        }
    }
    groups.sort_by_key(|(trigger, _)| *trigger);
    for (trigger, entries) in groups {
        for raw in entries {
            let action = match (raw.check, raw.run) {
                (Some(check), _) => HookAction::Check(check),
                (None, Some(run)) => HookAction::Run(run),
                (None, None) => {
                    tracing::warn!(%trigger, "Ignoring hook with neither check nor run");
                    continue;
                }
            };
            definitions.push(HookDefinition {
                trigger,
                action,
                on_fail: raw.on_fail,
                message: raw.message,
                files: raw.files,
                timeout_secs: raw.timeout,
            });
        }
    }
    Ok(definitions)
}

/// Loads hook definitions for the project; a missing or malformed file
/// means no hooks.
#[must_use]
pub fn load_hooks(ctx: &ServiceContext, paths: &ProjectPaths) -> Vec<HookDefinition> {
    let path = paths.hooks();
    if !ctx.fs.exists(&path) {
        return Vec::new();
    }
    let parsed = ctx
        .fs
        .read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_hooks(&text).map_err(|e| e.to_string()));
    parsed.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to load hooks");
        Vec::new()
    })
}
