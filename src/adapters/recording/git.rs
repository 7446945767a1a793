//! Recording adapter for the `GitRepo` port.

use std::path::Path;

use serde::Serialize;

use super::{record_result, SharedRecorder};
use crate::ports::git::GitRepo;
use crate::ports::PortError;

/// Records git queries while delegating to an inner implementation.
pub struct RecordingGitRepo {
    inner: Box<dyn GitRepo>,
    recorder: SharedRecorder,
}

impl RecordingGitRepo {
    #[must_use]
    pub fn new(inner: Box<dyn GitRepo>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct GitInput<'a> {
    root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    arg: Option<&'a str>,
}

fn input<'a>(root: &Path, arg: Option<&'a str>) -> GitInput<'a> {
    GitInput { root: root.display().to_string(), arg }
}

impl GitRepo for RecordingGitRepo {
    fn current_commit(&self, root: &Path) -> Result<String, PortError> {
        let result = self.inner.current_commit(root);
        record_result(&self.recorder, "git", "current_commit", &input(root, None), &result);
        result
    }

    fn commits_since(&self, root: &Path, since: &str) -> Result<Vec<String>, PortError> {
        let result = self.inner.commits_since(root, since);
        record_result(&self.recorder, "git", "commits_since", &input(root, Some(since)), &result);
        result
    }

    fn changed_files(&self, root: &Path, hash: &str) -> Result<Vec<String>, PortError> {
        let result = self.inner.changed_files(root, hash);
        record_result(&self.recorder, "git", "changed_files", &input(root, Some(hash)), &result);
        result
    }

    fn last_author(&self, root: &Path, file: &str) -> Result<String, PortError> {
        let result = self.inner.last_author(root, file);
        record_result(&self.recorder, "git", "last_author", &input(root, Some(file)), &result);
        result
    }
}
