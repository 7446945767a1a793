//! Textual import/export extraction and specifier resolution.
//!
//! Matching is heuristic: a handful of per-language patterns, no parsing.
//! Specifiers that cannot be resolved to a scanned file are dropped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::scan::{file_name, parent_dir};

/// Extensions tried when a specifier omits one.
const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".kt", ".java", ".py", ".rs", ".go"];

/// Index files tried when a specifier names a directory.
const INDEX_FILES: &[&str] = &["index.ts", "index.js", "mod.rs", "__init__.py"];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static ES_IMPORT: Lazy<Regex> =
    Lazy::new(|| re(r#"(?:import|export)\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]"#));
static CALL_IMPORT: Lazy<Regex> =
    Lazy::new(|| re(r#"(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#));
static JVM_IMPORT: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+?)(?:\.\*)?\s*;?\s*$"));
static PY_FROM: Lazy<Regex> = Lazy::new(|| re(r"(?m)^\s*from\s+(\.*[\w.]*)\s+import\b"));
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| re(r"(?m)^\s*import\s+([\w.]+)"));
static GO_BLOCK: Lazy<Regex> = Lazy::new(|| re(r"(?s)import\s*\((.*?)\)"));
static GO_SINGLE: Lazy<Regex> = Lazy::new(|| re(r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#));
static QUOTED: Lazy<Regex> = Lazy::new(|| re(r#""([^"]+)""#));
static RUST_MOD: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;"));

static ES_EXPORT: Lazy<Regex> =
    Lazy::new(|| re(r"export\s+(?:async\s+)?(?:function\*?|const|let|var|class|interface|type|enum)\s+(\w+)"));
static ES_DEFAULT: Lazy<Regex> = Lazy::new(|| re(r"export\s+default\b"));
static RUST_PUB: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*pub\s+(?:async\s+)?(?:fn|struct|enum|trait|const|type)\s+(\w+)"));

fn captures(re: &Regex, content: &str) -> Vec<String> {
    re.captures_iter(content).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()).collect()
}

/// Joins a relative specifier onto `dir`, normalising `.` and `..`.
///
/// Returns `None` when the path escapes the project root.
#[must_use]
pub fn join_relative(dir: &str, spec: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in spec.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Specifiers that are not relative are kept only when they look internal.
fn bare_is_internal(spec: &str) -> bool {
    spec.contains('/') && !spec.starts_with('@') && !spec.contains("node_modules")
}

/// Turns a JS-style specifier into a candidate project path.
fn path_candidate(importer_dir: &str, spec: &str) -> Option<String> {
    if spec.starts_with('.') {
        join_relative(importer_dir, spec)
    } else if bare_is_internal(spec) {
        Some(spec.trim_start_matches('/').to_string())
    } else {
        None
    }
}

/// `..models.user` → `../models/user`; `app.models` → `app/models`.
fn python_candidate(importer_dir: &str, spec: &str) -> Option<String> {
    let dots = spec.chars().take_while(|c| *c == '.').count();
    let rest = spec[dots..].replace('.', "/");
    if dots == 0 {
        return rest.contains('/').then_some(rest);
    }
    let mut relative = String::from("./");
    for _ in 1..dots {
        relative.push_str("../");
    }
    relative.push_str(&rest);
    join_relative(importer_dir, &relative)
}

/// Candidate project paths imported by a file, before resolution.
#[must_use]
pub fn import_candidates(path: &str, language: &str, content: &str) -> Vec<String> {
    let dir = parent_dir(path);
    match language {
        "typescript" | "javascript" => captures(&ES_IMPORT, content)
            .into_iter()
            .chain(captures(&CALL_IMPORT, content))
            .filter_map(|spec| path_candidate(dir, &spec))
            .collect(),
        "kotlin" | "java" => captures(&JVM_IMPORT, content)
            .into_iter()
            .filter(|spec| spec.contains('.'))
            .map(|spec| spec.replace('.', "/"))
            .collect(),
        "python" => captures(&PY_FROM, content)
            .into_iter()
            .chain(captures(&PY_IMPORT, content))
            .filter_map(|spec| python_candidate(dir, &spec))
            .collect(),
        "go" => {
            let mut specs = captures(&GO_SINGLE, content);
            for block in captures(&GO_BLOCK, content) {
                specs.extend(captures(&QUOTED, &block));
            }
            specs.into_iter().filter_map(|spec| path_candidate(dir, &spec)).collect()
        }
        "rust" => {
            let name = file_name(path);
            let module_dir = if matches!(name, "mod.rs" | "lib.rs" | "main.rs") {
                dir.to_string()
            } else {
                let stem = name.trim_end_matches(".rs");
                if dir.is_empty() { stem.to_string() } else { format!("{dir}/{stem}") }
            };
            captures(&RUST_MOD, content)
                .into_iter()
                .filter_map(|m| join_relative(&module_dir, &m))
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Resolves a candidate to a known file: exact match, then with a source
/// extension, then as a directory index. JVM-style candidates also match
/// by path suffix (`com/acme/Foo` → `app/src/main/java/com/acme/Foo.java`).
#[must_use]
pub fn resolve(candidate: &str, known: &HashSet<&str>, by_suffix: bool) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    if known.contains(candidate) {
        return Some(candidate.to_string());
    }
    for ext in RESOLVE_EXTENSIONS {
        let with_ext = format!("{candidate}{ext}");
        if known.contains(with_ext.as_str()) {
            return Some(with_ext);
        }
    }
    for index in INDEX_FILES {
        let with_index = format!("{candidate}/{index}");
        if known.contains(with_index.as_str()) {
            return Some(with_index);
        }
    }
    if by_suffix {
        let mut hits: Vec<&&str> = known
            .iter()
            .filter(|k| {
                RESOLVE_EXTENSIONS.iter().any(|ext| k.ends_with(&format!("/{candidate}{ext}")))
            })
            .collect();
        if hits.len() == 1 {
            return hits.pop().map(|k| (*k).to_string());
        }
    }
    None
}

/// Exported symbol names; `default` marks a default export.
#[must_use]
pub fn extract_exports(language: &str, content: &str) -> Vec<String> {
    let mut exports = match language {
        "typescript" | "javascript" => {
            let mut names = captures(&ES_EXPORT, content);
            if ES_DEFAULT.is_match(content) {
                names.push("default".to_string());
            }
            names
        }
        "rust" => captures(&RUST_PUB, content),
        _ => Vec::new(),
    };
    let mut seen = HashSet::new();
    exports.retain(|e| seen.insert(e.clone()));
    exports
}
