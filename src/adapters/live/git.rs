//! Live git adapter using `git` CLI commands.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::shell::run_with_timeout;
use crate::ports::git::GitRepo;
use crate::ports::PortError;

/// Timeout for walking the commit log.
const LOG_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for single-commit and single-file queries.
const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Live git adapter that shells out to the `git` CLI.
pub struct LiveGitRepo;

impl LiveGitRepo {
    fn git(root: &Path, args: &[&str], timeout: Duration) -> Result<String, PortError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(root).args(args);
        let output = run_with_timeout(cmd, timeout)?;
        if output.timed_out {
            return Err(format!("git {} timed out after {}s", args[0], timeout.as_secs()).into());
        }
        if output.exit_code != 0 {
            return Err(format!("git {} failed: {}", args[0], output.stderr.trim()).into());
        }
        Ok(output.stdout)
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
}

impl GitRepo for LiveGitRepo {
    fn current_commit(&self, root: &Path) -> Result<String, PortError> {
        Ok(Self::git(root, &["rev-parse", "HEAD"], QUERY_TIMEOUT)?.trim().to_string())
    }

    fn commits_since(&self, root: &Path, since: &str) -> Result<Vec<String>, PortError> {
        let since = format!("--since={since}");
        let out = Self::git(root, &["log", "--format=%H", &since], LOG_TIMEOUT)?;
        Ok(non_empty_lines(&out))
    }

    fn changed_files(&self, root: &Path, hash: &str) -> Result<Vec<String>, PortError> {
        let out = Self::git(
            root,
            &["diff-tree", "--no-commit-id", "--name-only", "-r", hash],
            QUERY_TIMEOUT,
        )?;
        Ok(non_empty_lines(&out))
    }

    fn last_author(&self, root: &Path, file: &str) -> Result<String, PortError> {
        let out = Self::git(root, &["log", "--format=%aN", "-1", "--", file], QUERY_TIMEOUT)?;
        let author = out.trim();
        if author.is_empty() {
            return Err(format!("no history for {file}").into());
        }
        Ok(author.to_string())
    }
}
