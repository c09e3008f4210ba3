//! Pipeline result types

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::shared::models::{BundleFormat, OutputKind};

/// One written output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    /// `/`-separated path relative to the root the file was found under
    pub relative_path: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: OutputKind,
}

/// Outcome of a successful bundle build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleOutput {
    pub entry: String,
    pub format: BundleFormat,
    pub package_dir: PathBuf,
    /// Outputs in processing order
    pub files: Vec<FileMapping>,
    pub duration_ms: u64,
}

impl BundleOutput {
    pub fn transformed_count(&self) -> usize {
        self.count(OutputKind::Transformed)
    }

    pub fn copied_count(&self) -> usize {
        self.count(OutputKind::Verbatim)
    }

    fn count(&self, kind: OutputKind) -> usize {
        self.files.iter().filter(|f| f.kind == kind).count()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().map(|f| &f.output)
    }

    /// Outputs written more than once; the last writer's content is on disk
    pub fn duplicate_outputs(&self) -> Vec<&PathBuf> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for output in self.outputs() {
            if !seen.insert(output) && !duplicates.contains(&output) {
                duplicates.push(output);
            }
        }
        duplicates
    }
}
