//! Locations of everything under the project-local `.steer/` directory.

use std::path::{Path, PathBuf};

/// Name of the namespace directory at the project root.
pub const STEER_DIR: &str = ".steer";

/// Resolved on-disk layout for one project.
///
/// ```text
/// <root>/.steer/
///   ├── config.json
///   ├── RULES.md
///   ├── hooks.yaml
///   ├── templates/<mode>.md
///   ├── codebase-map.json
///   └── state/
///       ├── current-task.json
///       └── history.jsonl
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    dir: PathBuf,
}

impl ProjectPaths {
    /// Layout for the project rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf(), dir: root.join(STEER_DIR) }
    }

    /// Project root (working directory for hook commands).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.steer/` directory itself.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    #[must_use]
    pub fn rules(&self) -> PathBuf {
        self.dir.join("RULES.md")
    }

    #[must_use]
    pub fn hooks(&self) -> PathBuf {
        self.dir.join("hooks.yaml")
    }

    #[must_use]
    pub fn templates(&self) -> PathBuf {
        self.dir.join("templates")
    }

    /// Template file for a mode, e.g. `templates/bugfix.md`.
    #[must_use]
    pub fn template(&self, mode: &str) -> PathBuf {
        self.templates().join(format!("{mode}.md"))
    }

    #[must_use]
    pub fn codebase_map(&self) -> PathBuf {
        self.dir.join("codebase-map.json")
    }

    #[must_use]
    pub fn current_task(&self) -> PathBuf {
        self.dir.join("state").join("current-task.json")
    }

    #[must_use]
    pub fn history(&self) -> PathBuf {
        self.dir.join("state").join("history.jsonl")
    }

    #[must_use]
    pub fn gitignore(&self) -> PathBuf {
        self.dir.join(".gitignore")
    }
}
