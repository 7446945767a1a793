//! `steer impact` command.

use super::print_section;
use super::task::format_impact;
use crate::config::load_config;
use crate::context::ServiceContext;
use crate::impact::calculate_impact;
use crate::paths::ProjectPaths;
use crate::store::TaskStore;
use crate::workflow::file_refs::resolve_file_ref;

/// Execute the `impact` command against the saved map.
///
/// File arguments resolve the same way as `@path` references.
///
/// # Errors
///
/// Returns an error string if no codebase map has been built.
pub fn run(ctx: &ServiceContext, paths: &ProjectPaths, files: &[String]) -> Result<(), String> {
    let map = TaskStore::new(ctx, paths)
        .load_codebase_map()
        .ok_or_else(|| "No codebase map. Run `steer map` first.".to_string())?;
    let config = load_config(ctx, paths);
    let files: Vec<String> = files.iter().map(|f| resolve_file_ref(f, Some(&map))).collect();
    let preview = calculate_impact(&files, &map, &config.defaults.critical_modules);
    print_section("Impact:", &format_impact(&preview));
    Ok(())
}
