//! `steer init` command.

use super::{display_relative, map};
use crate::context::ServiceContext;
use crate::paths::ProjectPaths;
use crate::workflow::defaults::{scaffold, InitOptions};

/// Execute the `init` command.
///
/// Writes the scaffold, then builds the codebase map unless `build_map` is false.
///
/// # Errors
///
/// Returns an error string if a scaffold file or the map cannot be written.
pub fn run(ctx: &ServiceContext, paths: &ProjectPaths, options: &InitOptions, build_map: bool) -> Result<(), String> {
    let report = scaffold(ctx, paths, options).map_err(|e| e.to_string())?;
    for path in &report.written {
        println!("created {}", display_relative(path, paths.root()));
    }
    for path in &report.kept {
        println!("kept    {} (use --force to overwrite)", display_relative(path, paths.root()));
    }
    if build_map {
        map::run(ctx, paths)?;
    }
    println!("Initialized {}", display_relative(paths.dir(), paths.root()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cassette, project_context, ManualClock};

    #[test]
    fn init_without_map_writes_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = project_context(&ManualClock::at("2025-03-01T09:00:00Z"), &cassette(vec![]));
        let paths = ProjectPaths::new(dir.path());

        run(&ctx, &paths, &InitOptions::default(), false).unwrap();
        assert!(paths.config().exists());
        assert!(paths.template("bugfix").exists());
        assert!(!paths.codebase_map().exists());
    }
}
