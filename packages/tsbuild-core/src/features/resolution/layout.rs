//! Default distribution layout

use std::path::{Path, PathBuf};

use super::ports::Packaging;
use crate::config::OutputConfig;
use crate::shared::models::BundleFormat;

/// `<root>/<entry>/<format dir>/<relative path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistLayout {
    root: PathBuf,
    node_dir: String,
    other_dir: String,
}

impl DistLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = OutputConfig::default();
        Self {
            root: root.into(),
            node_dir: defaults.node_dir,
            other_dir: defaults.other_dir,
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            root: output.root.clone(),
            node_dir: output.node_dir.clone(),
            other_dir: output.other_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format_dir(&self, format: BundleFormat) -> &str {
        match format {
            BundleFormat::Node => &self.node_dir,
            BundleFormat::Other => &self.other_dir,
        }
    }

    /// Directory a bundle's files are written under
    pub fn bundle_root(&self, format: BundleFormat, entry: &str) -> PathBuf {
        join_segments(&self.root, entry).join(self.format_dir(format))
    }
}

impl Packaging for DistLayout {
    fn output_paths(&self, format: BundleFormat, relative_path: &str, entry: &str) -> Vec<PathBuf> {
        vec![join_segments(&self.bundle_root(format, entry), relative_path)]
    }
}

fn join_segments(base: &Path, slash_path: &str) -> PathBuf {
    slash_path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .fold(base.to_path_buf(), |acc, s| acc.join(s))
}
