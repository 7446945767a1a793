//! Source tree scan: file discovery, roles, languages, and line counts.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::FileRole;
use crate::config::CodemapConfig;
use crate::context::ServiceContext;
use crate::error::{Result, SteerError};
use crate::paths::STEER_DIR;

/// Entry names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "coverage",
    ".cache",
    ".turbo",
    "__pycache__",
    ".gradle",
    "venv",
    ".venv",
    "target",
    "bin",
    "obj",
];

static TEST_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\.test\.\w+$)|(\.spec\.\w+$)|(Test\.\w+$)|(_test\.\w+$)|(^test_\w+\.\w+$)")
        .expect("valid regex")
});

/// A scanned source file with its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: String,
    pub role: FileRole,
    pub language: &'static str,
    pub loc: usize,
    pub content: String,
}

impl ScannedFile {
    /// Final path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Final `/`-separated segment of a relative path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a relative path (empty at the root).
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Language for a source extension, or `None` if the file is not source.
#[must_use]
pub fn language_for(extension: &str) -> Option<&'static str> {
    let lang = match extension {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "kt" | "kts" => "kotlin",
        "java" => "java",
        "py" => "python",
        "go" => "go",
        "rs" => "rust",
        "swift" => "swift",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        _ => return None,
    };
    Some(lang)
}

/// Infers a file's role; the first matching rule wins.
#[must_use]
pub fn classify_role(path: &str) -> FileRole {
    let name = file_name(path);
    let segments: Vec<&str> = path.split('/').collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    let lower_path = path.to_ascii_lowercase();
    let lower_name = name.to_ascii_lowercase();

    if TEST_NAME.is_match(name) || dirs.iter().any(|d| *d == "tests" || *d == "__tests__") {
        return FileRole::Test;
    }
    if lower_path.contains("config") {
        return FileRole::Config;
    }
    if dirs.iter().any(|d| d.eq_ignore_ascii_case("doc") || d.eq_ignore_ascii_case("docs"))
        || lower_name.starts_with("readme")
    {
        return FileRole::Doc;
    }

    let stem = lower_name.rsplit_once('.').map_or(lower_name.as_str(), |(stem, _)| stem);
    let has = |needles: &[&str]| needles.iter().any(|n| stem.contains(n));
    if has(&["model", "entity", "dto"]) {
        FileRole::Model
    } else if has(&["service"]) {
        FileRole::Service
    } else if has(&["controller", "handler"]) {
        FileRole::Controller
    } else if has(&["repo"]) {
        FileRole::Repository
    } else if has(&["view", "fragment", "component", "page"]) {
        FileRole::View
    } else if has(&["util", "helper"]) {
        FileRole::Utility
    } else {
        FileRole::Source
    }
}

/// Whether a directory or file entry is pruned from the walk.
fn is_excluded(name: &str, excludes: &[String]) -> bool {
    if DEFAULT_EXCLUDES.contains(&name) {
        return true;
    }
    if name.starts_with('.') && name != STEER_DIR {
        return true;
    }
    excludes.iter().any(|e| e.trim_end_matches('/') == name)
}

/// Walks `root` and reads every source file.
///
/// Unreadable files are skipped with a warning.
///
/// # Errors
///
/// Returns an error if `root` itself cannot be walked.
pub fn scan_files(ctx: &ServiceContext, root: &Path, config: &CodemapConfig) -> Result<Vec<ScannedFile>> {
    let excludes = &config.exclude_paths;
    let paths = ctx
        .fs
        .walk_files(root, &|name| is_excluded(name, excludes))
        .map_err(|e| SteerError::io(root, e))?;

    let mut files = Vec::new();
    for path in paths {
        let Some(language) = file_name(&path).rsplit_once('.').and_then(|(_, ext)| language_for(ext))
        else {
            continue;
        };
        let content = match ctx.fs.read_to_string(&root.join(&path)) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Skipping unreadable source file");
                continue;
            }
        };
        files.push(ScannedFile {
            role: classify_role(&path),
            language,
            loc: content.split('\n').count(),
            content,
            path,
        });
    }
    tracing::debug!(root = %root.display(), files = files.len(), "Scanned source tree");
    Ok(files)
}
