//! Team configuration and rules loading.
//!
//! `config.json` is merged section by section over the built-in defaults:
//! any section or field missing from the file keeps its default value.

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::paths::ProjectPaths;

/// Top-level `.steer/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SteerConfig {
    /// Config schema version.
    pub version: String,
    /// Optional team name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Project-wide defaults.
    pub defaults: ProjectDefaults,
    /// Model tier policy, surfaced in status output.
    pub model_policy: ModelPolicy,
    /// Codebase map settings.
    pub codemap: CodemapConfig,
}

impl Default for SteerConfig {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            team: None,
            defaults: ProjectDefaults::default(),
            model_policy: ModelPolicy::default(),
            codemap: CodemapConfig::default(),
        }
    }
}

/// The `defaults` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectDefaults {
    pub branch: String,
    /// Path prefixes whose modules are treated as critical.
    pub critical_modules: Vec<String>,
    pub test_command: String,
    pub lint_command: String,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            critical_modules: Vec::new(),
            test_command: "npm test".to_string(),
            lint_command: "npm run lint".to_string(),
        }
    }
}

/// The `modelPolicy` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelPolicy {
    #[serde(rename = "default")]
    pub default_tier: String,
    pub critical_modules: String,
    pub design_mode: String,
    pub loc_threshold: u32,
    pub file_count_threshold: u32,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            default_tier: "mid".to_string(),
            critical_modules: "high".to_string(),
            design_mode: "high".to_string(),
            loc_threshold: 300,
            file_count_threshold: 3,
        }
    }
}

/// The `codemap` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodemapConfig {
    pub refresh_on: String,
    pub strategy: String,
    /// Entry names (directories or files) skipped during the scan.
    pub exclude_paths: Vec<String>,
    /// Lookback window for change coupling, in months.
    pub coupling_months: u32,
    /// Minimum ratio for a coupling edge to be retained (exclusive).
    pub coupling_threshold: f64,
    /// Commit cap for coupling mining.
    pub max_commits: usize,
    /// File cap for ownership lookups.
    pub ownership_limit: usize,
}

impl Default for CodemapConfig {
    fn default() -> Self {
        Self {
            refresh_on: "steer.start".to_string(),
            strategy: "incremental".to_string(),
            exclude_paths: ["node_modules/", ".git/", "build/", "dist/"]
                .into_iter()
                .map(String::from)
                .collect(),
            coupling_months: 3,
            coupling_threshold: 0.3,
            max_commits: 200,
            ownership_limit: 100,
        }
    }
}

/// Loads `config.json`, falling back to defaults when it is missing or malformed.
#[must_use]
pub fn load_config(ctx: &ServiceContext, paths: &ProjectPaths) -> SteerConfig {
    let path = paths.config();
    if !ctx.fs.exists(&path) {
        return SteerConfig::default();
    }
    let content = match ctx.fs.read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
            return SteerConfig::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
        SteerConfig::default()
    })
}

/// Loads the team rules text, or `None` when there is none.
#[must_use]
pub fn load_rules(ctx: &ServiceContext, paths: &ProjectPaths) -> Option<String> {
    let path = paths.rules();
    if !ctx.fs.exists(&path) {
        return None;
    }
    match ctx.fs.read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read rules");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cassette, project_context, ManualClock};

    fn ctx() -> ServiceContext {
        project_context(&ManualClock::at("2025-01-01T00:00:00Z"), &cassette(vec![]))
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&ctx(), &ProjectPaths::new(dir.path()));
        assert_eq!(config, SteerConfig::default());
        assert!((config.codemap.coupling_threshold - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_sections_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        std::fs::create_dir_all(paths.dir()).unwrap();
        std::fs::write(
            paths.config(),
            r#"{"defaults": {"criticalModules": ["src/auth"]}, "codemap": {"couplingMonths": 6}}"#,
        )
        .unwrap();

        let config = load_config(&ctx(), &paths);
        assert_eq!(config.defaults.critical_modules, vec!["src/auth"]);
        assert_eq!(config.defaults.test_command, "npm test");
        assert_eq!(config.codemap.coupling_months, 6);
        assert_eq!(config.codemap.max_commits, 200);
        assert_eq!(config.model_policy.default_tier, "mid");
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        std::fs::create_dir_all(paths.dir()).unwrap();
        std::fs::write(paths.config(), "{not json").unwrap();

        assert_eq!(load_config(&ctx(), &paths), SteerConfig::default());
    }

    #[test]
    fn rules_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        assert_eq!(load_rules(&ctx(), &paths), None);

        std::fs::create_dir_all(paths.dir()).unwrap();
        std::fs::write(paths.rules(), "# Rules\n- Test everything\n").unwrap();
        assert!(load_rules(&ctx(), &paths).unwrap().contains("Test everything"));
    }
}
