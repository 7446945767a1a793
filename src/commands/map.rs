//! `steer map` command.

use crate::config::load_config;
use crate::context::ServiceContext;
use crate::map::{build_codebase_map, CodebaseMap};
use crate::paths::ProjectPaths;
use crate::store::TaskStore;

/// Summary lines printed after a build.
fn summary(map: &CodebaseMap) -> Vec<String> {
    let critical = map.modules.values().filter(|m| m.critical).count();
    let mut lines = vec![
        format!("Map built: {} modules ({critical} critical), {} files", map.modules.len(), map.file_count()),
        format!("Language: {} | Build: {}", map.language, map.build_system),
    ];
    match (&map.change_coupling, &map.ownership) {
        (None, None) => lines.push("No git history; coupling and ownership omitted.".to_string()),
        (coupling, ownership) => {
            if let Some(coupling) = coupling {
                lines.push(format!("Change coupling: {} files", coupling.len()));
            }
            if let Some(ownership) = ownership {
                lines.push(format!("Ownership: {} files", ownership.len()));
            }
        }
    }
    lines
}

/// Execute the `map` command.
///
/// # Errors
///
/// Returns an error string if the tree cannot be scanned or the map cannot be saved.
pub fn run(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let config = load_config(ctx, paths);
    let map = build_codebase_map(ctx, paths.root(), &config).map_err(|e| e.to_string())?;
    TaskStore::new(ctx, paths).save_codebase_map(&map).map_err(|e| e.to_string())?;
    for line in summary(&map) {
        println!("{line}");
    }
    Ok(())
}
