//! Replaying adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::FileSystem;
use crate::ports::PortError;

/// Replays recorded filesystem operations from a cassette.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a new replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, PortError> {
        let output = next_output(&self.replayer, "fs", "read_to_string");
        replay_result(&output, "fs::read_to_string")
    }

    fn write(&self, _path: &Path, _contents: &str) -> Result<(), PortError> {
        let output = next_output(&self.replayer, "fs", "write");
        replay_result::<Option<()>>(&output, "fs::write").map(|_| ())
    }

    fn append(&self, _path: &Path, _contents: &str) -> Result<(), PortError> {
        let output = next_output(&self.replayer, "fs", "append");
        replay_result::<Option<()>>(&output, "fs::append").map(|_| ())
    }

    fn exists(&self, _path: &Path) -> bool {
        let output = next_output(&self.replayer, "fs", "exists");
        output.as_bool().expect("fs::exists: expected boolean output")
    }

    fn walk_files(
        &self,
        _root: &Path,
        _skip: &dyn Fn(&str) -> bool,
    ) -> Result<Vec<String>, PortError> {
        let output = next_output(&self.replayer, "fs", "walk_files");
        replay_result(&output, "fs::walk_files")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::test_support::replayer;
    use serde_json::json;

    #[test]
    fn read_to_string_ok_and_err() {
        let fs = ReplayingFileSystem::new(replayer(vec![
            ("fs", "read_to_string", json!({"ok": "file contents"})),
            ("fs", "read_to_string", json!({"err": "file not found"})),
        ]));
        assert_eq!(fs.read_to_string(Path::new("/a")).unwrap(), "file contents");
        let err = fs.read_to_string(Path::new("/missing")).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn write_and_append_accept_null_output() {
        let fs = ReplayingFileSystem::new(replayer(vec![
            ("fs", "write", json!(null)),
            ("fs", "append", json!({"ok": null})),
        ]));
        assert!(fs.write(Path::new("/a"), "x").is_ok());
        assert!(fs.append(Path::new("/b"), "y").is_ok());
    }

    #[test]
    fn walk_files_replays_listing() {
        let fs = ReplayingFileSystem::new(replayer(vec![(
            "fs",
            "walk_files",
            json!({"ok": ["src/a.ts", "src/b.ts"]}),
        )]));
        let files = fs.walk_files(Path::new("/p"), &|_| false).unwrap();
        assert_eq!(files, vec!["src/a.ts", "src/b.ts"]);
    }
}
