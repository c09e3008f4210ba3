//! Recursive source discovery

use std::path::Path;
use tracing::debug;

use super::infrastructure::OsEntrySource;
use super::ports::EntrySource;
use crate::errors::{BuildError, Result};
use crate::features::matching::PathMatcher;
use crate::shared::models::SourceFile;

/// Depth-first enumeration of source files under a root.
///
/// Siblings are visited in name order, so the result is stable for a fixed
/// tree. Every directory is descended, including ones whose files are all
/// excluded.
pub struct TreeWalker<S: EntrySource = OsEntrySource> {
    source: S,
    matcher: PathMatcher,
}

impl TreeWalker<OsEntrySource> {
    pub fn new(matcher: PathMatcher) -> Self {
        Self::with_source(OsEntrySource::new(), matcher)
    }
}

impl<S: EntrySource> TreeWalker<S> {
    pub fn with_source(source: S, matcher: PathMatcher) -> Self {
        Self { source, matcher }
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// Enumerate included files under `root`
    pub fn walk(&self, root: &Path) -> Result<Vec<SourceFile>> {
        if !self.source.is_directory(root) {
            return Err(BuildError::not_found("source root", root));
        }

        let mut files = Vec::new();
        self.walk_dir(root, "", &mut files)?;
        debug!("Discovered {} source files under {}", files.len(), root.display());
        Ok(files)
    }

    fn walk_dir(&self, dir: &Path, relative: &str, files: &mut Vec<SourceFile>) -> Result<()> {
        let mut entries = self.source.list_entries(dir)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in entries {
            let child_relative = if relative.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", relative, entry.name)
            };
            let child = dir.join(&entry.name);

            if entry.is_directory {
                self.walk_dir(&child, &child_relative, files)?;
            } else if self.matcher.should_include(&child_relative) {
                files.push(SourceFile::new(child_relative, child));
            }
        }

        Ok(())
    }
}
