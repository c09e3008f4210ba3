//! Transform - compiling one source file
//!
//! [`Transformer`] is the pipeline-facing step; the [`Compiler`] port hides the
//! actual source-to-source compiler. [`TypeStripCompiler`] is the built-in one.

pub mod compiler;
pub mod ports;
mod transformer;

pub use compiler::{SourceDialect, TypeStripCompiler};
pub use ports::{CompiledOutput, Compiler, ModuleFormat, TargetRuntimes, TransformOptions};
pub use transformer::Transformer;
