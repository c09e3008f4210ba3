//! Infrastructure - filesystem and in-memory entry sources

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use super::ports::{DirEntry, EntrySource};
use crate::errors::{BuildError, Result};

/// Entry source backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntrySource;

impl OsEntrySource {
    pub fn new() -> Self {
        Self
    }
}

impl EntrySource for OsEntrySource {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let failed = e.path().unwrap_or(path).to_path_buf();
                BuildError::io(failed, io::Error::from(e))
            })?;

            let Some(name) = entry.file_name().to_str() else {
                warn!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };

            entries.push(DirEntry {
                name: name.to_string(),
                is_directory: entry.file_type().is_dir(),
            });
        }

        Ok(entries)
    }
}

/// In-memory directory tree, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntrySource {
    directories: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
}

impl InMemoryEntrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree rooted at `root` containing the given `/`-separated files
    pub fn with_files<I, S>(root: impl AsRef<Path>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.as_ref();
        let mut source = Self::new();
        source.add_directory(root);
        for file in files {
            let path = file
                .as_ref()
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(root.to_path_buf(), |acc, s| acc.join(s));
            source.add_file(path);
        }
        source
    }

    /// Add a directory and all of its ancestors
    pub fn add_directory(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.directories.insert(ancestor.to_path_buf());
        }
    }

    /// Add a file, creating its parent directories
    pub fn add_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_directory(parent);
        }
        self.files.insert(path.to_path_buf());
    }
}

impl EntrySource for InMemoryEntrySource {
    fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>> {
        if !self.directories.contains(path) {
            return Err(BuildError::io(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            ));
        }

        let children = |set: &BTreeSet<PathBuf>, is_directory: bool| -> Vec<DirEntry> {
            set.iter()
                .filter(|p| p.parent() == Some(path))
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
                .map(|name| DirEntry {
                    name: name.to_string(),
                    is_directory,
                })
                .collect()
        };

        let mut entries = children(&self.directories, true);
        entries.extend(children(&self.files, false));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_os_source_lists_sorted_children() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("c.ts"), "").unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();

        let entries = OsEntrySource::new().list_entries(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.ts"),
                DirEntry::directory("b"),
                DirEntry::file("c.ts"),
            ]
        );
    }

    #[test]
    fn test_os_source_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = OsEntrySource::new().list_entries(&missing).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Io);
    }

    #[cfg(unix)]
    #[test]
    fn test_os_source_reports_symlinked_directory_as_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let entries = OsEntrySource::new().list_entries(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![DirEntry::file("link"), DirEntry::directory("real")]
        );
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemoryEntrySource::with_files("/pkg/src", ["a/foo.ts", "index.ts"]);
        assert!(source.is_directory(Path::new("/pkg/src")));
        assert!(source.is_directory(Path::new("/pkg/src/a")));
        assert!(!source.is_directory(Path::new("/pkg/src/index.ts")));

        let entries = source.list_entries(Path::new("/pkg/src")).unwrap();
        assert_eq!(
            entries,
            vec![DirEntry::directory("a"), DirEntry::file("index.ts")]
        );
    }

    #[test]
    fn test_in_memory_source_unknown_directory() {
        let source = InMemoryEntrySource::with_files("/pkg/src", ["a.ts"]);
        assert!(source.list_entries(Path::new("/elsewhere")).is_err());
    }
}
