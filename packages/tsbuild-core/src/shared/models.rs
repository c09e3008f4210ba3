//! Core data model shared by every pipeline component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Distribution format a bundle is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    Node,
    Other,
}

impl BundleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Node => "node",
            BundleFormat::Other => "other",
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One package-build target: an entry identifier plus the target format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleSpec {
    pub entry: String,
    pub format: BundleFormat,
}

impl BundleSpec {
    pub fn new(entry: impl Into<String>, format: BundleFormat) -> Self {
        Self {
            entry: entry.into(),
            format,
        }
    }

    pub fn node(entry: impl Into<String>) -> Self {
        Self::new(entry, BundleFormat::Node)
    }
}

impl fmt::Display for BundleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.entry, self.format)
    }
}

/// A file discovered for processing.
///
/// `relative_path` is relative to the root the file was found under and
/// always uses `/` as separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl SourceFile {
    pub fn new(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
        }
    }

    /// Build from a root and a `/`-separated relative path
    pub fn under(root: &Path, relative_path: &str) -> Self {
        let absolute_path = relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment));
        Self::new(relative_path, absolute_path)
    }
}

/// How an output file is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Compiled from the source
    Transformed,
    /// Byte-for-byte copy of the source
    Verbatim,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Transformed => "transformed",
            OutputKind::Verbatim => "verbatim",
        }
    }
}

/// Destination of one source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputPath {
    pub absolute_path: PathBuf,
    pub kind: OutputKind,
}

impl OutputPath {
    /// Directory that must exist before the output is written
    pub fn parent_dir(&self) -> Option<&Path> {
        self.absolute_path.parent()
    }
}

/// Successful transform of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub content: String,
}
