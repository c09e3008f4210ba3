//! Ports - packaging layout and package lookup collaborators

use std::path::PathBuf;

use crate::errors::Result;
use crate::shared::models::BundleFormat;

/// Distribution layout service.
///
/// Returns every destination a source-relative file is published to; the
/// pipeline writes the first one.
pub trait Packaging: Send + Sync {
    fn output_paths(&self, format: BundleFormat, relative_path: &str, entry: &str) -> Vec<PathBuf>;
}

/// Resolves a bundle entry identifier to its package directory
pub trait PackageLocator: Send + Sync {
    fn locate(&self, entry: &str) -> Result<PathBuf>;
}
