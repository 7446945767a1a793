//! `steer status` command.

use crate::context::ServiceContext;
use crate::paths::ProjectPaths;
use crate::store::TaskStore;
use crate::workflow::status::format_status;

/// Execute the `status` command.
///
/// # Errors
///
/// Returns an error string if the snapshot exists but cannot be read.
pub fn run(ctx: &ServiceContext, paths: &ProjectPaths) -> Result<(), String> {
    let state = TaskStore::new(ctx, paths).read_current_task().map_err(|e| e.to_string())?;
    println!("{}", format_status(state.as_ref(), ctx.clock.now()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cassette, project_context, ManualClock};

    #[test]
    fn status_without_task_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = project_context(&ManualClock::at("2025-03-01T09:00:00Z"), &cassette(vec![]));
        assert!(run(&ctx, &ProjectPaths::new(dir.path())).is_ok());
    }
}
