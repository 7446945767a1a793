//! Replaying adapter for the `GitRepo` port.

use std::path::Path;
use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::git::GitRepo;
use crate::ports::PortError;

/// Replays recorded git queries from a cassette.
pub struct ReplayingGitRepo {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingGitRepo {
    /// Creates a new replaying git repo from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl GitRepo for ReplayingGitRepo {
    fn current_commit(&self, _root: &Path) -> Result<String, PortError> {
        let output = next_output(&self.replayer, "git", "current_commit");
        replay_result(&output, "git::current_commit")
    }

    fn commits_since(&self, _root: &Path, _since: &str) -> Result<Vec<String>, PortError> {
        let output = next_output(&self.replayer, "git", "commits_since");
        replay_result(&output, "git::commits_since")
    }

    fn changed_files(&self, _root: &Path, _hash: &str) -> Result<Vec<String>, PortError> {
        let output = next_output(&self.replayer, "git", "changed_files");
        replay_result(&output, "git::changed_files")
    }

    fn last_author(&self, _root: &Path, _file: &str) -> Result<String, PortError> {
        let output = next_output(&self.replayer, "git", "last_author");
        replay_result(&output, "git::last_author")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::test_support::replayer;
    use serde_json::json;

    #[test]
    fn replays_history_queries() {
        let git = ReplayingGitRepo::new(replayer(vec![
            ("git", "commits_since", json!({"ok": ["c1", "c2"]})),
            ("git", "changed_files", json!({"ok": ["a.ts", "b.ts"]})),
            ("git", "last_author", json!({"err": "no history"})),
        ]));
        let root = Path::new("/p");
        assert_eq!(git.commits_since(root, "2024-01-01").unwrap(), vec!["c1", "c2"]);
        assert_eq!(git.changed_files(root, "c1").unwrap(), vec!["a.ts", "b.ts"]);
        assert!(git.last_author(root, "a.ts").is_err());
    }
}
