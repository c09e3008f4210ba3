//! Package locators

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ports::PackageLocator;
use crate::errors::{BuildError, Result};

/// Searches package roots in order for `<root>/<entry>` directories
#[derive(Debug, Clone, Default)]
pub struct WorkspaceLocator {
    roots: Vec<PathBuf>,
}

impl WorkspaceLocator {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl PackageLocator for WorkspaceLocator {
    fn locate(&self, entry: &str) -> Result<PathBuf> {
        for root in &self.roots {
            let candidate = entry
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(root.clone(), |acc, s| acc.join(s));
            if candidate.is_dir() {
                debug!("Resolved package '{}' to {}", entry, candidate.display());
                return Ok(candidate);
            }
        }

        Err(BuildError::not_found(
            format!("package '{}' in {} package root(s)", entry, self.roots.len()),
            self.roots.first().map(PathBuf::as_path).unwrap_or(Path::new(entry)),
        ))
    }
}

/// Fixed entry → directory table
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    packages: HashMap<String, PathBuf>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, entry: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(entry.into(), dir.into());
        self
    }
}

impl PackageLocator for StaticLocator {
    fn locate(&self, entry: &str) -> Result<PathBuf> {
        match self.packages.get(entry) {
            Some(dir) if dir.is_dir() => Ok(dir.clone()),
            Some(dir) => Err(BuildError::not_found(format!("package '{}'", entry), dir)),
            None => Err(BuildError::not_found(
                format!("package '{}'", entry),
                Path::new(entry),
            )),
        }
    }
}
