//! Built-in scaffolding written by `steer init`.

use std::path::PathBuf;

use super::state::TaskMode;
use crate::config::SteerConfig;
use crate::context::ServiceContext;
use crate::error::{Result, SteerError};
use crate::paths::ProjectPaths;

/// Default team rules.
pub const DEFAULT_RULES: &str = include_str!("scaffold/RULES.md");

/// Default hook definitions.
pub const DEFAULT_HOOKS: &str = include_str!("scaffold/hooks.yaml");

/// Keeps task state out of version control.
pub const GITIGNORE: &str = "state/\n";

/// The bundled template text for `mode`.
#[must_use]
pub fn default_template(mode: TaskMode) -> &'static str {
    match mode {
        TaskMode::Bugfix => include_str!("scaffold/bugfix.md"),
        TaskMode::Feature => include_str!("scaffold/feature.md"),
        TaskMode::Refactor => include_str!("scaffold/refactor.md"),
        TaskMode::Design => include_str!("scaffold/design.md"),
        TaskMode::Debug => include_str!("scaffold/debug.md"),
    }
}

/// Overrides applied to the generated `config.json`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub critical_modules: Vec<String>,
    pub test_command: Option<String>,
    pub lint_command: Option<String>,
    /// Overwrite files that already exist.
    pub force: bool,
}

/// Which scaffold files were written and which were left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub written: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
}

/// The config `init` writes: defaults plus the caller's overrides.
///
/// Critical modules are normalized to project-relative prefixes
/// (`./src/auth/` becomes `src/auth`).
///
/// # Errors
///
/// Returns [`SteerError::Config`] for an absolute or escaping critical
/// module path, or an empty command.
pub fn initial_config(options: &InitOptions) -> Result<SteerConfig> {
    let mut config = SteerConfig::default();
    config.defaults.critical_modules =
        options.critical_modules.iter().map(|m| normalize_module(m)).collect::<Result<_>>()?;
    for (name, command, slot) in [
        ("test", &options.test_command, &mut config.defaults.test_command),
        ("lint", &options.lint_command, &mut config.defaults.lint_command),
    ] {
        if let Some(cmd) = command {
            if cmd.trim().is_empty() {
                return Err(SteerError::Config(format!("{name} command must not be empty")));
            }
            slot.clone_from(cmd);
        }
    }
    Ok(config)
}

fn normalize_module(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') || trimmed.split('/').any(|s| s == "..") {
        return Err(SteerError::Config(format!("critical module '{raw}' must be a path inside the project")));
    }
    let module = trimmed.trim_start_matches("./").trim_end_matches('/');
    if module.is_empty() || module == "." {
        return Err(SteerError::Config(format!("critical module '{raw}' names no directory")));
    }
    Ok(module.to_string())
}

/// Writes the `.steer/` scaffold. Existing files are kept unless `force` is set.
///
/// # Errors
///
/// Returns an error if the config cannot be serialized or a file cannot be written.
pub fn scaffold(ctx: &ServiceContext, paths: &ProjectPaths, options: &InitOptions) -> Result<InitReport> {
    let config = serde_json::to_string_pretty(&initial_config(options)?)
        .map_err(|e| SteerError::Serialize(e.to_string()))?;

    let mut files = vec![
        (paths.config(), format!("{config}\n")),
        (paths.rules(), DEFAULT_RULES.to_string()),
        (paths.hooks(), DEFAULT_HOOKS.to_string()),
        (paths.gitignore(), GITIGNORE.to_string()),
    ];
    files.extend(TaskMode::ALL.map(|mode| (paths.template(mode.as_str()), default_template(mode).to_string())));

    let mut report = InitReport::default();
    for (path, contents) in files {
        if !options.force && ctx.fs.exists(&path) {
            tracing::debug!(path = %path.display(), "Keeping existing file");
            report.kept.push(path);
            continue;
        }
        ctx.fs.write(&path, &contents).map_err(|e| SteerError::io(&path, e))?;
        report.written.push(path);
    }
    Ok(report)
}
