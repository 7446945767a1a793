//! Assembles a [`CodebaseMap`] from a scan, import edges, test pairings,
//! and git history.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::history::{collect_ownership, mine_change_coupling};
use super::imports::{extract_exports, import_candidates, resolve};
use super::scan::{file_name, parent_dir, scan_files, ScannedFile};
use super::test_match::{pair_tests, TestPairing};
use super::{CodebaseMap, FileDependency, FileInfo, FileRole, ModuleInfo, ModuleType, TestFileInfo};
use crate::config::SteerConfig;
use crate::context::ServiceContext;
use crate::error::Result;

const SHARED_MODULE_NAMES: &[&str] = &["shared", "common", "lib", "utils", "util", "core"];

const BUILD_MARKERS: &[(&str, &str)] = &[
    ("package.json", "npm"),
    ("build.gradle", "gradle"),
    ("build.gradle.kts", "gradle"),
    ("pom.xml", "maven"),
    ("Cargo.toml", "cargo"),
    ("go.mod", "go"),
    ("setup.py", "python"),
    ("pyproject.toml", "python"),
];

/// Module key for a file: its first two directories (`src/auth/`), its
/// only directory (`src/`), or `./` at the root.
#[must_use]
pub fn module_key(path: &str) -> String {
    let dirs: Vec<&str> = parent_dir(path).split('/').filter(|s| !s.is_empty()).collect();
    match dirs.as_slice() {
        [] => "./".to_string(),
        [only] => format!("{only}/"),
        [first, second, ..] => format!("{first}/{second}/"),
    }
}

/// Whether a module key and a configured critical path contain one another.
#[must_use]
pub fn is_critical_module(key: &str, critical_modules: &[String]) -> bool {
    let key = key.trim_end_matches('/');
    critical_modules.iter().map(|cm| cm.trim_end_matches('/')).any(|cm| {
        !cm.is_empty() && (key.starts_with(cm) || cm.starts_with(key))
    })
}

fn module_type(key: &str, files: &BTreeMap<String, FileInfo>) -> ModuleType {
    if files.values().all(|f| f.role == FileRole::Test) {
        return ModuleType::TestModule;
    }
    let last = key.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if SHARED_MODULE_NAMES.contains(&last) {
        ModuleType::SharedModule
    } else {
        ModuleType::FeatureModule
    }
}

fn detect_modules(
    files: &[ScannedFile],
    pairings: &[TestPairing],
    critical_modules: &[String],
) -> BTreeMap<String, ModuleInfo> {
    let mut grouped: BTreeMap<String, Vec<&ScannedFile>> = BTreeMap::new();
    for file in files {
        grouped.entry(module_key(&file.path)).or_default().push(file);
    }
    let covers: BTreeMap<&str, &TestPairing> = pairings.iter().map(|p| (p.test.as_str(), p)).collect();

    grouped
        .into_iter()
        .map(|(key, members)| {
            let infos: BTreeMap<String, FileInfo> = members
                .iter()
                .map(|f| {
                    let info = FileInfo { role: f.role, loc: f.loc, language: f.language.to_string() };
                    (f.path.clone(), info)
                })
                .collect();

            let tests: Vec<&&ScannedFile> = members.iter().filter(|f| f.role == FileRole::Test).collect();
            let test_dir = tests.first().map(|t| {
                let dir = parent_dir(&t.path);
                if dir.is_empty() { ".".to_string() } else { dir.to_string() }
            });
            let test_files = (!tests.is_empty()).then(|| {
                tests
                    .iter()
                    .filter_map(|t| covers.get(t.path.as_str()))
                    .filter(|p| p.covers != file_name(&p.test))
                    .map(|p| (p.test.clone(), TestFileInfo { covers: p.covers.clone() }))
                    .collect()
            });

            let info = ModuleInfo {
                module_type: module_type(&key, &infos),
                critical: is_critical_module(&key, critical_modules),
                files: infos,
                test_dir,
                test_files,
            };
            (key, info)
        })
        .collect()
}

fn build_dependencies(
    files: &[ScannedFile],
    pairings: &[TestPairing],
) -> BTreeMap<String, FileDependency> {
    let mut deps: BTreeMap<String, FileDependency> =
        files.iter().map(|f| (f.path.clone(), FileDependency::default())).collect();
    for pairing in pairings {
        if let Some(dep) = pairing.source.as_ref().and_then(|s| deps.get_mut(s)) {
            dep.tested_by.get_or_insert_with(|| pairing.test.clone());
        }
    }

    let known: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let mut edges = Vec::new();
    for file in files.iter().filter(|f| f.role.is_code()) {
        let by_suffix = matches!(file.language, "kotlin" | "java");
        let mut seen = HashSet::new();
        for candidate in import_candidates(&file.path, file.language, &file.content) {
            match resolve(&candidate, &known, by_suffix) {
                Some(target) if target != file.path => {
                    if seen.insert(target.clone()) {
                        edges.push((file.path.clone(), target));
                    }
                }
                Some(_) => {}
                None => tracing::trace!(file = %file.path, import = %candidate, "Unresolved import"),
            }
        }
        if let Some(dep) = deps.get_mut(&file.path) {
            dep.exports = extract_exports(file.language, &file.content);
        }
    }

    for (importer, target) in edges {
        if let Some(dep) = deps.get_mut(&importer) {
            dep.imports.push(target.clone());
        }
        if let Some(dep) = deps.get_mut(&target) {
            dep.called_by.push(importer);
        }
    }
    deps
}

fn primary_language(files: &[ScannedFile]) -> String {
    let mut loc_by_language: BTreeMap<&str, usize> = BTreeMap::new();
    for file in files.iter().filter(|f| f.role.is_code()) {
        *loc_by_language.entry(file.language).or_default() += file.loc;
    }
    loc_by_language
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map_or_else(|| "unknown".to_string(), |(lang, _)| lang.to_string())
}

fn detect_build_system(ctx: &ServiceContext, root: &Path) -> String {
    BUILD_MARKERS
        .iter()
        .find(|(marker, _)| ctx.fs.exists(&root.join(marker)))
        .map_or("unknown", |(_, system)| *system)
        .to_string()
}

/// Scans `root` and builds a fresh codebase map.
///
/// Git-derived sections are omitted when history is unavailable.
///
/// # Errors
///
/// Returns an error only if the source tree cannot be walked.
pub fn build_codebase_map(ctx: &ServiceContext, root: &Path, config: &SteerConfig) -> Result<CodebaseMap> {
    let files = scan_files(ctx, root, &config.codemap)?;
    let pairings = pair_tests(&files);

    let modules = detect_modules(&files, &pairings, &config.defaults.critical_modules);
    let dependencies = build_dependencies(&files, &pairings);

    let commit = match ctx.git.current_commit(root) {
        Ok(hash) => Some(hash.trim().to_string()),
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "No HEAD commit");
            None
        }
    };
    let scanned_at = ctx.clock.now();
    let change_coupling = mine_change_coupling(ctx, root, &config.codemap, scanned_at);
    let owned: Vec<&str> =
        files.iter().filter(|f| f.role != FileRole::Test).map(|f| f.path.as_str()).collect();
    let ownership = collect_ownership(ctx, root, &owned, config.codemap.ownership_limit);

    tracing::info!(
        files = files.len(),
        modules = modules.len(),
        coupling = change_coupling.is_some(),
        "Built codebase map"
    );
    Ok(CodebaseMap {
        root: root.display().to_string(),
        scanned_at,
        commit,
        language: primary_language(&files),
        build_system: detect_build_system(ctx, root),
        modules,
        dependencies,
        change_coupling,
        ownership,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cassette, project_context, ManualClock};
    use serde_json::json;

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[test]
    fn module_keys() {
        assert_eq!(module_key("src/auth/login.ts"), "src/auth/");
        assert_eq!(module_key("src/auth/deep/x.ts"), "src/auth/");
        assert_eq!(module_key("src/routes.ts"), "src/");
        assert_eq!(module_key("main.go"), "./");
    }

    #[test]
    fn critical_match_works_in_both_directions() {
        let critical = vec!["src/auth".to_string()];
        assert!(is_critical_module("src/auth/", &critical));
        assert!(is_critical_module("src/", &critical));
        assert!(!is_critical_module("lib/", &critical));
        assert!(is_critical_module("src/payments/", &["src/payments/stripe".to_string()]));
    }

    #[test]
    fn builds_graph_tests_history_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", "{}");
        write(root, "src/auth/login.ts", "export function login() {}\nexport default login;\n");
        write(root, "src/routes.ts", "import { login } from './auth/login';\nimport x from 'react';\n");
        write(root, "src/auth/login.test.ts", "import { login } from './login';\n");
        write(root, "lib/utils/strings.ts", "export const trim = 1;\n");
        write(root, "node_modules/react/index.js", "module.exports = {};\n");

        let clock = ManualClock::at("2025-03-01T09:00:00Z");
        let ctx = project_context(
            &clock,
            &cassette(vec![
                ("git", "current_commit", json!({"ok": "abc123\n"})),
                ("git", "commits_since", json!({"ok": ["c1", "c2"]})),
                ("git", "changed_files", json!({"ok": ["src/auth/login.ts", "src/routes.ts"]})),
                ("git", "changed_files", json!({"ok": ["src/auth/login.ts"]})),
                ("git", "last_author", json!({"ok": "Ada"})),
                ("git", "last_author", json!({"ok": "Grace"})),
                ("git", "last_author", json!({"err": "no history"})),
            ]),
        );
        let mut config = SteerConfig::default();
        config.defaults.critical_modules = vec!["src/auth".to_string()];

        let map = build_codebase_map(&ctx, root, &config).unwrap();

        assert_eq!(map.file_count(), 4);
        assert_eq!(map.commit.as_deref(), Some("abc123"));
        assert_eq!(map.language, "typescript");
        assert_eq!(map.build_system, "npm");

        let login = &map.dependencies["src/auth/login.ts"];
        assert_eq!(login.called_by, vec!["src/routes.ts"]);
        assert_eq!(login.exports, vec!["login", "default"]);
        assert_eq!(login.tested_by.as_deref(), Some("src/auth/login.test.ts"));
        assert_eq!(map.dependencies["src/routes.ts"].imports, vec!["src/auth/login.ts"]);
        assert!(map.dependencies["src/auth/login.test.ts"].imports.is_empty(), "tests are not parsed");

        let auth = &map.modules["src/auth/"];
        assert!(auth.critical);
        assert_eq!(auth.module_type, ModuleType::FeatureModule);
        assert_eq!(auth.test_dir.as_deref(), Some("src/auth"));
        assert_eq!(auth.test_files.as_ref().unwrap()["src/auth/login.test.ts"].covers, "login.ts");
        assert_eq!(map.modules["lib/utils/"].module_type, ModuleType::SharedModule);
        assert!(!map.modules["lib/utils/"].critical);

        let coupling = map.change_coupling.as_ref().unwrap();
        assert!((coupling["src/routes.ts"]["src/auth/login.ts"] - 1.0).abs() < 1e-9);
        assert!((coupling["src/auth/login.ts"]["src/routes.ts"] - 0.5).abs() < 1e-9);

        let ownership = map.ownership.as_ref().unwrap();
        assert_eq!(ownership["lib/utils/strings.ts"], "Ada");
        assert_eq!(ownership["src/auth/login.ts"], "Grace");
        assert!(!ownership.contains_key("src/routes.ts"));
    }

    #[test]
    fn map_without_git_omits_history_sections() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.go", "package main\n");

        let clock = ManualClock::at("2025-03-01T09:00:00Z");
        let ctx = project_context(
            &clock,
            &cassette(vec![
                ("git", "current_commit", json!({"err": "not a git repository"})),
                ("git", "commits_since", json!({"err": "not a git repository"})),
                ("git", "last_author", json!({"err": "not a git repository"})),
            ]),
        );
        let map = build_codebase_map(&ctx, dir.path(), &SteerConfig::default()).unwrap();

        assert!(map.commit.is_none());
        assert!(!map.has_history());
        assert_eq!(map.build_system, "unknown");
        assert_eq!(map.modules["./"].module_type, ModuleType::FeatureModule);
        assert_eq!(map.language, "go");
    }
}
