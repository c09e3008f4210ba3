//! Ports - compiler collaborator and its options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::Result;

/// Module system the compiled output uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// Keep `import` / `export` syntax
    EsModule,
    /// Rewrite module syntax to `require` / `exports`
    CommonJs,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleFormat::EsModule => "esmodule",
            ModuleFormat::CommonJs => "commonjs",
        }
    }
}

impl Default for ModuleFormat {
    fn default() -> Self {
        ModuleFormat::EsModule
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtimes the output must support
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetRuntimes {
    /// Minimum Node.js major version
    pub node: u32,
    /// Browser support query (browserslist syntax)
    pub browsers: String,
}

impl Default for TargetRuntimes {
    fn default() -> Self {
        Self {
            node: 16,
            browsers: "> 1%, last 2 versions".to_string(),
        }
    }
}

/// Options handed to the compiler for every file of a run.
///
/// Passed by reference and never mutated once a run has started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    pub targets: TargetRuntimes,
    pub module_format: ModuleFormat,
}

impl TransformOptions {
    pub fn with_module_format(mut self, module_format: ModuleFormat) -> Self {
        self.module_format = module_format;
        self
    }
}

/// Compiler output for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub code: String,
}

/// Source-to-source compiler collaborator.
///
/// Implementations report unreadable input as [`BuildError::Io`] and syntax or
/// unsupported-construct failures as [`BuildError::Compile`], both carrying `path`.
///
/// [`BuildError::Io`]: crate::errors::BuildError::Io
/// [`BuildError::Compile`]: crate::errors::BuildError::Compile
pub trait Compiler: Send + Sync {
    /// Compiler identifier (for logs)
    fn name(&self) -> &str;

    /// Compile the file at `path`
    fn transform_file(&self, path: &Path, options: &TransformOptions) -> Result<CompiledOutput>;
}
