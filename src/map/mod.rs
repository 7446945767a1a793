//! Codebase map: modules, dependency edges, test pairing, change coupling,
//! and ownership for a source tree.
//!
//! The map is rebuilt on demand by [`build_codebase_map`] and persisted as
//! a single JSON snapshot. Everything keyed by file uses `/`-separated paths
//! relative to the project root, so the dependency graph is an adjacency map
//! and may contain cycles.

pub mod builder;
pub mod history;
pub mod imports;
pub mod scan;
pub mod test_match;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use builder::build_codebase_map;

/// Directed coupling: `file -> (other -> ratio)`.
pub type CouplingMap = BTreeMap<String, BTreeMap<String, f64>>;

/// Snapshot of a scanned source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseMap {
    /// Absolute project root at scan time.
    pub root: String,
    pub scanned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Primary language by line count.
    pub language: String,
    pub build_system: String,
    /// Modules keyed by path prefix (`src/auth/`).
    pub modules: BTreeMap<String, ModuleInfo>,
    /// Per-file dependency edges.
    pub dependencies: BTreeMap<String, FileDependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_coupling: Option<CouplingMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<BTreeMap<String, String>>,
}

impl CodebaseMap {
    /// Number of scanned files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Outgoing coupling edges for `file`, if any.
    #[must_use]
    pub fn coupling_for(&self, file: &str) -> Option<&BTreeMap<String, f64>> {
        self.change_coupling.as_ref().and_then(|c| c.get(file))
    }

    /// Whether the map carries any data mined from version control.
    #[must_use]
    pub fn has_history(&self) -> bool {
        self.change_coupling.is_some() || self.ownership.is_some()
    }
}

/// Kind of module, inferred from its files and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleType {
    FeatureModule,
    SharedModule,
    TestModule,
}

/// A group of files sharing a path prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub critical: bool,
    pub files: BTreeMap<String, FileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_files: Option<BTreeMap<String, TestFileInfo>>,
}

/// Role of a file, inferred from its name and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Test,
    Config,
    Doc,
    Model,
    Service,
    Controller,
    Repository,
    View,
    Utility,
    Source,
}

impl FileRole {
    /// Test, config, and doc files are not parsed for imports.
    #[must_use]
    pub fn is_code(self) -> bool {
        !matches!(self, Self::Test | Self::Config | Self::Doc)
    }
}

/// Per-file facts gathered by the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub role: FileRole,
    pub loc: usize,
    pub language: String,
}

/// Source basename a test file covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFileInfo {
    pub covers: String,
}

/// Dependency edges for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDependency {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub called_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_by: Option<String>,
}
