//! Built-in TypeScript compiler
//!
//! Parses `.ts` sources with tree-sitter-typescript and everything else with
//! tree-sitter-javascript, erases type-level syntax through byte-range edits
//! over the original text, lowers JSX to `React.createElement` calls and
//! optionally rewrites ES module syntax to CommonJS. Everything outside the
//! edited ranges is emitted unchanged, so formatting and comments survive.
//!
//! Target runtimes are recorded, not lowered: output is valid for any runtime
//! that accepts the input's JavaScript syntax.

mod edits;
mod enums;
mod jsx;
mod modules;
mod proposals;
mod strip;
mod syntax;

use std::fs;
use std::path::Path;

use tracing::debug;

use super::ports::{CompiledOutput, Compiler, TransformOptions};
use crate::errors::{BuildError, Diagnostic, Result};

/// Input language, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDialect {
    TypeScript,
    JavaScript,
}

impl SourceDialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => SourceDialect::TypeScript,
            _ => SourceDialect::JavaScript,
        }
    }
}

/// Type-stripping compiler built on tree-sitter
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeStripCompiler;

impl TypeStripCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile in-memory source.
    ///
    /// TypeScript input drops imports only referenced from type positions;
    /// JavaScript input keeps every import.
    pub fn transform_source(
        &self,
        source: &str,
        dialect: SourceDialect,
        options: &TransformOptions,
    ) -> std::result::Result<String, Diagnostic> {
        let source = proposals::expand_export_default_from(source);
        let tree = syntax::parse(&source, dialect)?;
        strip::strip(&source, &tree, dialect, options.module_format)
    }
}

impl Compiler for TypeStripCompiler {
    fn name(&self) -> &str {
        "type-strip"
    }

    fn transform_file(&self, path: &Path, options: &TransformOptions) -> Result<CompiledOutput> {
        let source = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        debug!(
            "Compiling {} (module={}, node={}, browsers='{}')",
            path.display(),
            options.module_format,
            options.targets.node,
            options.targets.browsers
        );

        let code = self
            .transform_source(&source, SourceDialect::from_path(path), options)
            .map_err(|diagnostic| BuildError::compile(path, diagnostic))?;
        Ok(CompiledOutput { code })
    }
}
