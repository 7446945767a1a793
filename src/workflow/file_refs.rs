//! `@path` references in task input, resolved against the codebase map.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::map::CodebaseMap;

static FILE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9._/-]+)").expect("valid regex"));

/// Raw references in input order, without duplicates.
#[must_use]
pub fn extract_file_refs(input: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for cap in FILE_REF.captures_iter(input) {
        let raw = cap[1].trim_end_matches('.').to_string();
        if !raw.is_empty() && !refs.contains(&raw) {
            refs.push(raw);
        }
    }
    refs
}

/// Maps a reference to a mapped file: exact key, then a key ending in
/// `/<ref>`, then the first key containing it. Unknown refs pass through.
#[must_use]
pub fn resolve_file_ref(reference: &str, map: Option<&CodebaseMap>) -> String {
    let Some(map) = map else {
        return reference.to_string();
    };
    if map.dependencies.contains_key(reference) {
        return reference.to_string();
    }
    let suffix = format!("/{reference}");
    let keys = map.dependencies.keys();
    keys.clone()
        .find(|k| k.ends_with(&suffix))
        .or_else(|| keys.clone().find(|k| k.contains(reference)))
        .cloned()
        .unwrap_or_else(|| reference.to_string())
}

/// One `path: imports=[..], calledBy=[..]` line per file with a dependency entry.
#[must_use]
pub fn codemap_excerpt(files: &[String], map: &CodebaseMap) -> Option<String> {
    let lines: Vec<String> = files
        .iter()
        .filter_map(|f| {
            map.dependencies.get(f).map(|dep| {
                format!("{f}: imports=[{}], calledBy=[{}]", dep.imports.join(", "), dep.called_by.join(", "))
            })
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::FileDependency;
    use crate::test_support::empty_map;

    fn map_with(files: &[(&str, &[&str], &[&str])]) -> CodebaseMap {
        let mut map = empty_map();
        for (path, imports, called_by) in files {
            map.dependencies.insert(
                (*path).to_string(),
                FileDependency {
                    imports: imports.iter().map(|s| (*s).to_string()).collect(),
                    called_by: called_by.iter().map(|s| (*s).to_string()).collect(),
                    ..FileDependency::default()
                },
            );
        }
        map
    }

    #[test]
    fn extracts_unique_refs_in_order() {
        let refs = extract_file_refs("fix @src/auth/login.ts and @routes.ts, see @src/auth/login.ts.");
        assert_eq!(refs, vec!["src/auth/login.ts", "routes.ts"]);
    }

    #[test]
    fn resolves_exact_then_suffix_then_substring() {
        let map = map_with(&[
            ("src/auth/login.ts", &[], &[]),
            ("src/routes.ts", &[], &[]),
            ("src/old_routes.ts", &[], &[]),
        ]);
        assert_eq!(resolve_file_ref("src/routes.ts", Some(&map)), "src/routes.ts");
        assert_eq!(resolve_file_ref("login.ts", Some(&map)), "src/auth/login.ts");
        assert_eq!(resolve_file_ref("auth/login", Some(&map)), "src/auth/login.ts");
        assert_eq!(resolve_file_ref("missing.ts", Some(&map)), "missing.ts");
        assert_eq!(resolve_file_ref("login.ts", None), "login.ts");
    }

    #[test]
    fn excerpt_lists_only_mapped_files() {
        let map = map_with(&[("src/auth/login.ts", &["src/db.ts"], &["src/routes.ts"])]);
        let files = vec!["src/auth/login.ts".to_string(), "README.md".to_string()];
        assert_eq!(
            codemap_excerpt(&files, &map).as_deref(),
            Some("src/auth/login.ts: imports=[src/db.ts], calledBy=[src/routes.ts]")
        );
        assert!(codemap_excerpt(&["x.ts".to_string()], &map).is_none());
    }
}
