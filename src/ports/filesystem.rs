//! Filesystem port for state, config, and source-tree access.

use std::path::Path;

use super::PortError;

/// Provides filesystem access for the store, loaders, and map scanner.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Replaces a file's contents, creating parent directories as needed.
    ///
    /// Implementations must not leave a partially written file behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Appends `contents` to a file in a single write, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Walks `root` recursively and returns the relative paths of all files,
    /// `/`-separated and sorted.
    ///
    /// `skip` is called with each entry's file name; entries for which it
    /// returns `true` are not visited (directories are pruned).
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be read.
    fn walk_files(&self, root: &Path, skip: &dyn Fn(&str) -> bool)
        -> Result<Vec<String>, PortError>;
}
