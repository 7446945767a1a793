//! Git port for history mining.

use std::path::Path;

use super::PortError;

/// Read-only queries against the repository containing the project.
///
/// Every method shells out with its own timeout in the live adapter; a
/// timeout surfaces as an error.
pub trait GitRepo: Send + Sync {
    /// Returns the hash of the current HEAD commit.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a repository or has no commits.
    fn current_commit(&self, root: &Path) -> Result<String, PortError>;

    /// Lists commit hashes newer than `since` (a `YYYY-MM-DD` date), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    fn commits_since(&self, root: &Path, since: &str) -> Result<Vec<String>, PortError>;

    /// Lists the paths changed by a single commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be inspected.
    fn changed_files(&self, root: &Path, hash: &str) -> Result<Vec<String>, PortError>;

    /// Returns the author name of the last commit touching `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or the file has no history.
    fn last_author(&self, root: &Path, file: &str) -> Result<String, PortError>;
}
