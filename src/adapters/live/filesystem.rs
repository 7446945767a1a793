//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::io::Write;
use std::path::Path;

use walkdir::WalkDir;

use crate::ports::filesystem::FileSystem;
use crate::ports::PortError;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename keeps the previous contents intact on crash.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn walk_files(
        &self,
        root: &Path,
        skip: &dyn Fn(&str) -> bool,
    ) -> Result<Vec<String>, PortError> {
        if !root.is_dir() {
            return Err(format!("not a directory: {}", root.display()).into());
        }
        let mut files = Vec::new();
        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_str().is_some_and(|name| skip(name))
        });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let rel: Vec<String> =
                rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
            files.push(rel.join("/"));
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_replaces_contents_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/current-task.json");

        LiveFileSystem.write(&path, "first").unwrap();
        LiveFileSystem.write(&path, "second").unwrap();

        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("state/current-task.json.tmp").exists());
    }

    #[test]
    fn append_accumulates_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");

        LiveFileSystem.append(&path, "a\n").unwrap();
        LiveFileSystem.append(&path, "b\n").unwrap();

        assert_eq!(LiveFileSystem.read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn walk_files_prunes_skipped_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/auth")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("src/auth/login.ts"), "").unwrap();
        std::fs::write(root.join("src/app.ts"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

        let files = LiveFileSystem.walk_files(root, &|name| name == "node_modules").unwrap();

        assert_eq!(files, vec!["src/app.ts", "src/auth/login.ts"]);
    }

    #[test]
    fn walk_files_errors_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LiveFileSystem.walk_files(&dir.path().join("nope"), &|_| false).is_err());
    }
}
