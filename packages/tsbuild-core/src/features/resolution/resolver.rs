//! Source → destination mapping

use std::path::PathBuf;
use std::sync::Arc;

use super::ports::Packaging;
use crate::errors::{BuildError, Result};
use crate::shared::models::{BundleSpec, OutputKind, OutputPath, SourceFile};

/// Extension rewritten on transformed output
pub const SOURCE_TS_EXTENSION: &str = ".ts";
/// Runtime script extension
pub const SCRIPT_EXTENSION: &str = ".js";

/// Maps a discovered file to its output path.
///
/// Pure: the result depends only on the file, the bundle and the layout.
#[derive(Clone)]
pub struct OutputResolver {
    packaging: Arc<dyn Packaging>,
    declaration_suffix: String,
}

impl OutputResolver {
    pub fn new(packaging: Arc<dyn Packaging>, declaration_suffix: impl Into<String>) -> Self {
        Self {
            packaging,
            declaration_suffix: declaration_suffix.into(),
        }
    }

    pub fn is_declaration(&self, relative_path: &str) -> bool {
        relative_path.ends_with(&self.declaration_suffix)
    }

    pub fn resolve(&self, file: &SourceFile, bundle: &BundleSpec) -> Result<OutputPath> {
        let main = self
            .packaging
            .output_paths(bundle.format, &file.relative_path, &bundle.entry)
            .into_iter()
            .next()
            .ok_or_else(|| {
                BuildError::not_found(
                    format!("output path for '{}' in {}", file.relative_path, bundle),
                    &file.absolute_path,
                )
            })?;

        if self.is_declaration(&file.relative_path) {
            return Ok(OutputPath {
                absolute_path: main,
                kind: OutputKind::Verbatim,
            });
        }

        Ok(OutputPath {
            absolute_path: with_script_extension(main),
            kind: OutputKind::Transformed,
        })
    }
}

fn with_script_extension(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(SOURCE_TS_EXTENSION)) {
        Some(stem) => PathBuf::from(format!("{}{}", stem, SCRIPT_EXTENSION)),
        None => path,
    }
}
