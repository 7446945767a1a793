//! Task store: persistence for the task snapshot, history, and codebase map.
//!
//! All I/O goes through `ctx.fs`, so the store works the same with live,
//! recording, and replaying adapters. Layout under `.steer/`:
//!
//! ```text
//! codebase-map.json
//! state/
//!   ├── current-task.json
//!   └── history.jsonl
//! ```

use serde::Serialize;

use crate::context::ServiceContext;
use crate::error::{Result, SteerError};
use crate::map::CodebaseMap;
use crate::paths::ProjectPaths;
use crate::workflow::state::{TaskHistoryEntry, TaskState};

/// Reads and writes the persisted workflow state of one project.
pub struct TaskStore<'a> {
    ctx: &'a ServiceContext,
    paths: &'a ProjectPaths,
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map(|json| format!("{json}\n"))
        .map_err(|e| SteerError::Serialize(e.to_string()))
}

impl<'a> TaskStore<'a> {
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, paths: &'a ProjectPaths) -> Self {
        Self { ctx, paths }
    }

    /// The last persisted task snapshot, or `None` when no task was ever started.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read or parsed.
    pub fn read_current_task(&self) -> Result<Option<TaskState>> {
        let path = self.paths.current_task();
        if !self.ctx.fs.exists(&path) {
            return Ok(None);
        }
        let contents = self.ctx.fs.read_to_string(&path).map_err(|e| SteerError::io(&path, e))?;
        serde_json::from_str(&contents).map(Some).map_err(|e| SteerError::parse(&path, e))
    }

    /// Replaces the snapshot with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_current_task(&self, state: &TaskState) -> Result<()> {
        let path = self.paths.current_task();
        let json = to_pretty_json(state)?;
        self.ctx.fs.write(&path, &json).map_err(|e| SteerError::io(&path, e))?;
        tracing::debug!(task_id = %state.task_id, step = %state.current_step, "Saved task snapshot");
        Ok(())
    }

    /// Appends one history line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the append fails.
    pub fn append_history(&self, entry: &TaskHistoryEntry) -> Result<()> {
        let path = self.paths.history();
        let line = serde_json::to_string(entry).map_err(|e| SteerError::Serialize(e.to_string()))?;
        self.ctx.fs.append(&path, &format!("{line}\n")).map_err(|e| SteerError::io(&path, e))
    }

    /// Every readable history entry, oldest first. Malformed lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the history file exists but cannot be read.
    pub fn read_history(&self) -> Result<Vec<TaskHistoryEntry>> {
        let path = self.paths.history();
        if !self.ctx.fs.exists(&path) {
            return Ok(Vec::new());
        }
        let contents = self.ctx.fs.read_to_string(&path).map_err(|e| SteerError::io(&path, e))?;
        Ok(contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(line = n + 1, error = %e, "Skipping malformed history line");
                    None
                }
            })
            .collect())
    }

    /// Saves the codebase map snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_codebase_map(&self, map: &CodebaseMap) -> Result<()> {
        let path = self.paths.codebase_map();
        let json = to_pretty_json(map)?;
        self.ctx.fs.write(&path, &json).map_err(|e| SteerError::io(&path, e))
    }

    /// The saved codebase map. A missing or unreadable map is `None`.
    #[must_use]
    pub fn load_codebase_map(&self) -> Option<CodebaseMap> {
        let path = self.paths.codebase_map();
        if !self.ctx.fs.exists(&path) {
            return None;
        }
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "Failed to read codebase map"))
            .ok()?;
        serde_json::from_str(&contents)
            .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "Failed to parse codebase map"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::Clock;
    use crate::test_support::{cassette, project_context, ManualClock};
    use crate::workflow::state::TaskMode;
    use crate::workflow::step::WorkflowStep;

    fn setup() -> (tempfile::TempDir, ManualClock, ServiceContext, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::at("2025-03-01T09:00:00Z");
        let ctx = project_context(&clock, &cassette(vec![]));
        let paths = ProjectPaths::new(dir.path());
        (dir, clock, ctx, paths)
    }

    #[test]
    fn missing_snapshot_reads_as_none() {
        let (_dir, _clock, ctx, paths) = setup();
        assert!(TaskStore::new(&ctx, &paths).read_current_task().unwrap().is_none());
    }

    #[test]
    fn snapshot_round_trips_with_camel_case_keys() {
        let (_dir, clock, ctx, paths) = setup();
        let store = TaskStore::new(&ctx, &paths);
        let mut state = TaskState::new("task_1".into(), TaskMode::Feature, clock.now());
        state.transition(WorkflowStep::Context, clock.now()).unwrap();
        store.write_current_task(&state).unwrap();

        let raw = std::fs::read_to_string(paths.current_task()).unwrap();
        assert!(raw.contains("\"currentStep\": \"CONTEXT\""));
        assert_eq!(store.read_current_task().unwrap(), Some(state));
    }

    #[test]
    fn malformed_snapshot_is_a_parse_error() {
        let (_dir, _clock, ctx, paths) = setup();
        std::fs::create_dir_all(paths.current_task().parent().unwrap()).unwrap();
        std::fs::write(paths.current_task(), "{not json").unwrap();
        let err = TaskStore::new(&ctx, &paths).read_current_task().unwrap_err();
        assert!(matches!(err, SteerError::Parse { .. }));
    }

    #[test]
    fn history_appends_lines_and_skips_garbage() {
        let (_dir, clock, ctx, paths) = setup();
        let store = TaskStore::new(&ctx, &paths);
        let state = TaskState::new("task_1".into(), TaskMode::Bugfix, clock.now());
        let entry = TaskHistoryEntry::from_state(&state, clock.now());
        store.append_history(&entry).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(paths.history())
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"garbage\n"))
            .unwrap();
        store.append_history(&entry).unwrap();

        let raw = std::fs::read_to_string(paths.history()).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert_eq!(store.read_history().unwrap(), vec![entry.clone(), entry]);
    }

    #[test]
    fn missing_map_loads_as_none() {
        let (_dir, _clock, ctx, paths) = setup();
        assert!(TaskStore::new(&ctx, &paths).load_codebase_map().is_none());
    }
}
