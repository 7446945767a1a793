//! Version-control mining: change coupling and ownership.
//!
//! Both sections are optional in the map. Any git failure is logged and
//! the section is omitted; nothing here returns an error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Months, Utc};

use super::CouplingMap;
use crate::config::CodemapConfig;
use crate::context::ServiceContext;

/// Commits touching more files than this are bulk changes (formatting,
/// renames, vendoring) and are left out of the co-change counts.
pub const MAX_FILES_PER_COMMIT: usize = 100;

fn round2(ratio: f64) -> f64 {
    (ratio * 100.0).round() / 100.0
}

/// Computes directed coupling ratios from per-commit file lists.
///
/// For files A and B, `A -> B` is `commits(A and B) / commits(A)`. An edge
/// is kept when its ratio exceeds `threshold`.
#[must_use]
pub fn compute_change_coupling(commits: &[Vec<String>], threshold: f64) -> CouplingMap {
    let mut file_counts: BTreeMap<&str, u32> = BTreeMap::new();
    let mut pair_counts: BTreeMap<(&str, &str), u32> = BTreeMap::new();

    for files in commits {
        let unique: BTreeSet<&str> = files.iter().map(String::as_str).collect();
        if unique.len() > MAX_FILES_PER_COMMIT {
            tracing::debug!(files = unique.len(), "Skipping bulk commit for coupling");
            continue;
        }
        let unique: Vec<&str> = unique.into_iter().collect();
        for (i, a) in unique.iter().enumerate() {
            *file_counts.entry(*a).or_default() += 1;
            for b in &unique[i + 1..] {
                *pair_counts.entry((*a, *b)).or_default() += 1;
            }
        }
    }

    let mut coupling = CouplingMap::new();
    let mut add_edge = |from: &str, to: &str, together: u32| {
        let total = file_counts.get(from).copied().unwrap_or(together).max(1);
        let ratio = f64::from(together) / f64::from(total);
        if ratio > threshold {
            coupling.entry(from.to_string()).or_default().insert(to.to_string(), round2(ratio));
        }
    };
    for (&(a, b), &together) in &pair_counts {
        add_edge(a, b, together);
        add_edge(b, a, together);
    }
    coupling
}

/// Mines coupling from the commits within the configured lookback window.
///
/// Returns `None` when git is unavailable or no edge survives.
#[must_use]
pub fn mine_change_coupling(
    ctx: &ServiceContext,
    root: &Path,
    config: &CodemapConfig,
    now: DateTime<Utc>,
) -> Option<CouplingMap> {
    let since = now.checked_sub_months(Months::new(config.coupling_months)).unwrap_or(now);
    let since = since.format("%Y-%m-%d").to_string();

    let hashes = match ctx.git.commits_since(root, &since) {
        Ok(hashes) => hashes,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "Git history unavailable, skipping change coupling");
            return None;
        }
    };

    let mut commits = Vec::new();
    for hash in hashes.iter().take(config.max_commits) {
        match ctx.git.changed_files(root, hash) {
            Ok(files) => commits.push(files),
            Err(e) => tracing::debug!(commit = %hash, error = %e, "Skipping commit"),
        }
    }

    let coupling = compute_change_coupling(&commits, config.coupling_threshold);
    tracing::debug!(commits = commits.len(), files = coupling.len(), "Mined change coupling");
    (!coupling.is_empty()).then_some(coupling)
}

/// Last author of each file, for at most `limit` files.
#[must_use]
pub fn collect_ownership(
    ctx: &ServiceContext,
    root: &Path,
    files: &[&str],
    limit: usize,
) -> Option<BTreeMap<String, String>> {
    let mut ownership = BTreeMap::new();
    for file in files.iter().take(limit) {
        match ctx.git.last_author(root, file) {
            Ok(author) if !author.trim().is_empty() => {
                ownership.insert((*file).to_string(), author.trim().to_string());
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(file = %file, error = %e, "No ownership for file"),
        }
    }
    (!ownership.is_empty()).then_some(ownership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::Clock;
    use crate::test_support::{cassette, project_context, ManualClock};
    use serde_json::json;

    fn commit(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| (*f).to_string()).collect()
    }

    #[test]
    fn coupling_is_directed() {
        let commits = vec![commit(&["A", "B"]), commit(&["A", "B"]), commit(&["A"])];
        let coupling = compute_change_coupling(&commits, 0.3);

        assert!((coupling["A"]["B"] - 0.67).abs() < 1e-9);
        assert!((coupling["B"]["A"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weak_edges_are_dropped_and_ratios_stay_in_unit_interval() {
        let commits = vec![
            commit(&["A", "B"]),
            commit(&["A"]),
            commit(&["A"]),
            commit(&["A"]),
            commit(&["B", "C", "B"]),
        ];
        let coupling = compute_change_coupling(&commits, 0.3);

        assert!(coupling.get("A").is_none(), "A->B is 1/4");
        assert!((coupling["B"]["A"] - 0.5).abs() < 1e-9);
        assert!((coupling["C"]["B"] - 1.0).abs() < 1e-9);
        for edges in coupling.values() {
            for ratio in edges.values() {
                assert!(*ratio > 0.0 && *ratio <= 1.0);
            }
        }
    }

    #[test]
    fn threshold_compares_the_unrounded_ratio() {
        // A -> B is 1/3: above 0.33 before rounding, exactly 0.33 after.
        let commits = vec![commit(&["A", "B"]), commit(&["A"]), commit(&["A"])];
        let coupling = compute_change_coupling(&commits, 0.33);
        assert_eq!(coupling["A"]["B"], 0.33);

        let at_threshold = compute_change_coupling(&commits, 1.0 / 3.0);
        assert!(!at_threshold.contains_key("A"));
    }

    #[test]
    fn bulk_commits_are_ignored() {
        let bulk: Vec<String> = (0..=MAX_FILES_PER_COMMIT).map(|i| format!("f{i}")).collect();
        assert!(compute_change_coupling(&[bulk], 0.3).is_empty());
    }

    #[test]
    fn mining_reads_commits_and_skips_failures() {
        let clock = ManualClock::at("2025-05-31T12:00:00Z");
        let ctx = project_context(
            &clock,
            &cassette(vec![
                ("git", "commits_since", json!({"ok": ["c1", "c2", "c3"]})),
                ("git", "changed_files", json!({"ok": ["src/a.ts", "src/b.ts"]})),
                ("git", "changed_files", json!({"err": "bad object"})),
                ("git", "changed_files", json!({"ok": ["src/a.ts", "src/b.ts"]})),
            ]),
        );
        let coupling =
            mine_change_coupling(&ctx, Path::new("/p"), &CodemapConfig::default(), clock.now())
                .unwrap();
        assert!((coupling["src/a.ts"]["src/b.ts"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_repository_omits_coupling() {
        let clock = ManualClock::at("2025-05-31T12:00:00Z");
        let ctx = project_context(
            &clock,
            &cassette(vec![("git", "commits_since", json!({"err": "not a git repository"}))]),
        );
        assert!(mine_change_coupling(&ctx, Path::new("/p"), &CodemapConfig::default(), clock.now())
            .is_none());
    }

    #[test]
    fn ownership_respects_limit_and_skips_errors() {
        let clock = ManualClock::at("2025-05-31T12:00:00Z");
        let ctx = project_context(
            &clock,
            &cassette(vec![
                ("git", "last_author", json!({"ok": "Ada\n"})),
                ("git", "last_author", json!({"err": "no history"})),
            ]),
        );
        let ownership =
            collect_ownership(&ctx, Path::new("/p"), &["a.ts", "b.ts", "c.ts"], 2).unwrap();
        assert_eq!(ownership.len(), 1);
        assert_eq!(ownership["a.ts"], "Ada");
    }
}
