//! Recording adapter for the `FileSystem` port.

use std::path::Path;

use serde::Serialize;

use super::{record_interaction, record_result, SharedRecorder};
use crate::ports::filesystem::FileSystem;
use crate::ports::PortError;

/// Records filesystem calls while delegating to an inner implementation.
///
/// Written contents are recorded so a replayed session can be diffed
/// against the original.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: SharedRecorder,
}

impl RecordingFileSystem {
    #[must_use]
    pub fn new(inner: Box<dyn FileSystem>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct PathInput {
    path: String,
}

#[derive(Serialize)]
struct WriteInput<'a> {
    path: String,
    contents: &'a str,
}

fn path_input(path: &Path) -> PathInput {
    PathInput { path: path.display().to_string() }
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        let result = self.inner.read_to_string(path);
        record_result(&self.recorder, "fs", "read_to_string", &path_input(path), &result);
        result
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        let result = self.inner.write(path, contents);
        let input = WriteInput { path: path.display().to_string(), contents };
        record_result(&self.recorder, "fs", "write", &input, &result);
        result
    }

    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        let result = self.inner.append(path, contents);
        let input = WriteInput { path: path.display().to_string(), contents };
        record_result(&self.recorder, "fs", "append", &input, &result);
        result
    }

    fn exists(&self, path: &Path) -> bool {
        let result = self.inner.exists(path);
        record_interaction(&self.recorder, "fs", "exists", &path_input(path), &result);
        result
    }

    fn walk_files(&self, root: &Path, skip: &dyn Fn(&str) -> bool) -> Result<Vec<String>, PortError> {
        let result = self.inner.walk_files(root, skip);
        record_result(&self.recorder, "fs", "walk_files", &path_input(root), &result);
        result
    }
}
