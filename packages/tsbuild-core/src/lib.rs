/*
 * tsbuild-core - Source-Tree Transpilation Pipeline
 *
 * Feature-First Architecture:
 * - shared/    : Common models (BundleSpec, SourceFile, OutputPath)
 * - features/  : Vertical slices (matching → walking → resolution → transform)
 * - pipeline/  : Per-bundle orchestration
 * - config/    : Versioned YAML configuration
 *
 * One bundle runs on one thread; files are processed in walk order and the
 * first failure aborts the bundle.
 */

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models
pub mod shared;

/// Feature modules (matching, walking, resolution, transform)
pub mod features;

/// Bundle pipeline
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{BuildConfig, ConfigError};
pub use errors::{BuildError, Diagnostic, ErrorKind, Result};
pub use features::matching::PathMatcher;
pub use features::resolution::{
    DistLayout, OutputResolver, PackageLocator, Packaging, StaticLocator, WorkspaceLocator,
};
pub use features::transform::{
    Compiler, ModuleFormat, TargetRuntimes, TransformOptions, Transformer, TypeStripCompiler,
};
pub use features::walking::{DirEntry, EntrySource, TreeWalker};
pub use pipeline::{BuildReporter, BundleOutput, FileMapping, Pipeline, TracingReporter};
pub use shared::models::{BundleFormat, BundleSpec, OutputKind, OutputPath, SourceFile};
