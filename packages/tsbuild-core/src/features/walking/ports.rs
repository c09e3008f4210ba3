//! Ports - Directory listing abstraction used by the tree walker

use std::path::Path;

use crate::errors::Result;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// Source of directory listings.
///
/// Symbolic links are reported with the link's own type: a link to a
/// directory is listed as a file.
pub trait EntrySource: Send + Sync {
    /// Whether `path` exists and is a directory
    fn is_directory(&self, path: &Path) -> bool;

    /// Direct children of `path`
    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>>;
}
