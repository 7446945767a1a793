//! Pairs test files with the source files they exercise, by name.

use std::collections::BTreeMap;

use super::scan::{file_name, parent_dir, ScannedFile};
use super::FileRole;

/// A test file and what it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPairing {
    pub test: String,
    /// Source basename the test name points at, e.g. `login.ts`.
    pub covers: String,
    /// Matched source file, when one exists.
    pub source: Option<String>,
}

/// Splits a basename into stem and final extension.
fn split_ext(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, ""))
}

/// Strips the test affix from a test file name, returning the source stem
/// and the extension: `login.test.ts` → (`login`, `ts`).
#[must_use]
pub fn source_stem_for_test(name: &str) -> (String, String) {
    let (stem, ext) = split_ext(name);
    let source_stem = [".test", ".spec", "_test"]
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .or_else(|| stem.strip_suffix("Test").filter(|s| !s.is_empty()))
        .or_else(|| stem.strip_prefix("test_"))
        .unwrap_or(stem);
    (source_stem.to_string(), ext.to_string())
}

/// Number of leading directory segments two paths share.
fn shared_depth(a: &str, b: &str) -> usize {
    parent_dir(a)
        .split('/')
        .zip(parent_dir(b).split('/'))
        .take_while(|(x, y)| x == y && !x.is_empty())
        .count()
}

/// Pairs every test file with a source file of the same stem.
///
/// Matching ignores directories; when several sources share the stem, the
/// one sharing the most leading directories with the test wins.
#[must_use]
pub fn pair_tests(files: &[ScannedFile]) -> Vec<TestPairing> {
    let mut sources_by_stem: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for file in files.iter().filter(|f| f.role != FileRole::Test) {
        let (stem, _) = split_ext(file.file_name());
        sources_by_stem.entry(stem).or_default().push(&file.path);
    }

    files
        .iter()
        .filter(|f| f.role == FileRole::Test)
        .map(|test| {
            let (stem, ext) = source_stem_for_test(file_name(&test.path));
            let source = sources_by_stem.get(stem.as_str()).and_then(|candidates| {
                candidates
                    .iter()
                    .enumerate()
                    .max_by_key(|(i, path)| (shared_depth(path, &test.path), usize::MAX - i))
                    .map(|(_, path)| (*path).to_string())
            });
            let covers = if ext.is_empty() { stem } else { format!("{stem}.{ext}") };
            TestPairing { test: test.path.clone(), covers, source }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::scan::classify_role;

    fn scanned(path: &str) -> ScannedFile {
        ScannedFile {
            path: path.to_string(),
            role: classify_role(path),
            language: "typescript",
            loc: 1,
            content: String::new(),
        }
    }

    #[test]
    fn name_transforms() {
        assert_eq!(source_stem_for_test("login.test.ts"), ("login".into(), "ts".into()));
        assert_eq!(source_stem_for_test("login.spec.js"), ("login".into(), "js".into()));
        assert_eq!(source_stem_for_test("LoginTest.kt"), ("Login".into(), "kt".into()));
        assert_eq!(source_stem_for_test("login_test.go"), ("login".into(), "go".into()));
        assert_eq!(source_stem_for_test("test_login.py"), ("login".into(), "py".into()));
        assert_eq!(source_stem_for_test("Test.java"), ("Test".into(), "java".into()));
    }

    #[test]
    fn pairs_across_directories() {
        let files = vec![
            scanned("src/auth/login.ts"),
            scanned("tests/auth/login.test.ts"),
            scanned("tests/orphan.test.ts"),
        ];
        let pairs = pair_tests(&files);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source.as_deref(), Some("src/auth/login.ts"));
        assert_eq!(pairs[0].covers, "login.ts");
        assert_eq!(pairs[1].source, None);
        assert_eq!(pairs[1].covers, "orphan.ts");
    }

    #[test]
    fn prefers_nearest_source_when_stems_collide() {
        let files = vec![
            scanned("src/admin/index.ts"),
            scanned("src/auth/index.ts"),
            scanned("src/auth/index.test.ts"),
        ];
        let pairs = pair_tests(&files);
        assert_eq!(pairs[0].source.as_deref(), Some("src/auth/index.ts"));
    }
}
