//! Impact calculator: blast radius and risk for a planned file set.
//!
//! Pure functions over an already-loaded [`CodebaseMap`]; nothing here
//! touches the filesystem or git.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::map::scan::file_name;
use crate::map::CodebaseMap;

/// Coupling edges below this ratio are not worth surfacing in a preview.
pub const SIGNIFICANT_COUPLING: f64 = 0.5;

/// Downstream fan-out above which a change is at least medium risk.
const WIDE_FAN_OUT: usize = 2;

/// Coarse risk grade. Ordered from least to most risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// A file that historically changes alongside a planned file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingCandidate {
    /// The coupled file.
    pub file: String,
    /// Planned file the edge starts from.
    pub source: String,
    pub coupling: f64,
    /// Whether `file` is already planned.
    pub in_scope: bool,
}

/// Blast radius of a planned change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactPreview {
    pub files_modified: Vec<String>,
    /// Files importing a planned file, excluding planned files.
    pub downstream: Vec<String>,
    pub tests_to_run: Vec<String>,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_coupling: Option<Vec<CouplingCandidate>>,
}

impl ImpactPreview {
    /// Coupled files that are not part of the plan.
    pub fn coupled_out_of_scope(&self) -> impl Iterator<Item = &CouplingCandidate> {
        self.change_coupling.iter().flatten().filter(|c| !c.in_scope)
    }
}

/// Pushes `item` unless already present; keeps first-seen order.
fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, item: &str) {
    if seen.insert(item.to_string()) {
        out.push(item.to_string());
    }
}

/// Direct dependents of `files`, excluding `files` themselves.
#[must_use]
pub fn find_downstream(files: &[String], map: &CodebaseMap) -> Vec<String> {
    let mut seen: HashSet<String> = files.iter().cloned().collect();
    let mut downstream = Vec::new();
    for file in files {
        let Some(dep) = map.dependencies.get(file) else {
            continue;
        };
        for caller in &dep.called_by {
            push_unique(&mut downstream, &mut seen, caller);
        }
    }
    downstream
}

/// Tests covering `files`: each file's paired test plus any module test
/// whose covered basename matches.
#[must_use]
pub fn find_related_tests(files: &[String], map: &CodebaseMap) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tests = Vec::new();
    for file in files {
        let Some(dep) = map.dependencies.get(file) else {
            continue;
        };
        if let Some(test) = &dep.tested_by {
            push_unique(&mut tests, &mut seen, test);
        }
        let basename = file_name(file);
        for module in map.modules.values() {
            for (test, info) in module.test_files.iter().flatten() {
                if info.covers == basename {
                    push_unique(&mut tests, &mut seen, test);
                }
            }
        }
    }
    tests
}

/// Whether `file` lies in any critical module.
#[must_use]
pub fn hits_critical(file: &str, critical_modules: &[String]) -> bool {
    critical_modules
        .iter()
        .filter(|cm| !cm.is_empty())
        .any(|cm| file.starts_with(cm.as_str()) || file.contains(cm.as_str()))
}

/// Grades a change.
///
/// HIGH when a critical file has dependents; MEDIUM when a critical file
/// is touched, fan-out is wide, or coupled files are left out; else LOW.
#[must_use]
pub fn compute_risk(
    files_modified: &[String],
    downstream: &[String],
    critical_modules: &[String],
    coupled_out_of_scope: usize,
) -> RiskLevel {
    let critical = files_modified.iter().any(|f| hits_critical(f, critical_modules));
    if critical && !downstream.is_empty() {
        RiskLevel::High
    } else if critical || downstream.len() > WIDE_FAN_OUT || coupled_out_of_scope > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Computes the impact preview for `planned` against `map`.
#[must_use]
pub fn calculate_impact(planned: &[String], map: &CodebaseMap, critical_modules: &[String]) -> ImpactPreview {
    let downstream = find_downstream(planned, map);
    let affected: Vec<String> = planned.iter().chain(&downstream).cloned().collect();
    let tests_to_run = find_related_tests(&affected, map);

    let mut candidates = Vec::new();
    for file in planned {
        let Some(edges) = map.coupling_for(file) else {
            continue;
        };
        for (other, ratio) in edges {
            if *ratio >= SIGNIFICANT_COUPLING {
                candidates.push(CouplingCandidate {
                    file: other.clone(),
                    source: file.clone(),
                    coupling: *ratio,
                    in_scope: planned.contains(other),
                });
            }
        }
    }
    let out_of_scope = candidates.iter().filter(|c| !c.in_scope).count();
    let risk_level = compute_risk(planned, &downstream, critical_modules, out_of_scope);

    ImpactPreview {
        files_modified: planned.to_vec(),
        downstream,
        tests_to_run,
        risk_level,
        change_coupling: (!candidates.is_empty()).then_some(candidates),
    }
}
