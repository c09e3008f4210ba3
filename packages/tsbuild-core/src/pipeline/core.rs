//! Bundle pipeline
//!
//! One run per [`BundleSpec`]: locate the package, enumerate its sources plus
//! the well-known declaration files, then write every file to its resolved
//! output. Files are processed one at a time in discovery order and the first
//! failure aborts the rest of the bundle. Outputs written before the failure
//! stay on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use super::reporter::{BuildReporter, TracingReporter};
use super::result::{BundleOutput, FileMapping};
use crate::config::BuildConfig;
use crate::errors::{BuildError, Result};
use crate::features::matching::PathMatcher;
use crate::features::resolution::{DistLayout, OutputResolver, PackageLocator, WorkspaceLocator};
use crate::features::transform::{TransformOptions, Transformer};
use crate::features::walking::TreeWalker;
use crate::shared::models::{BundleSpec, OutputKind, SourceFile};

// ═══════════════════════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════════════════════

/// Builds one bundle at a time.
///
/// Holds only immutable state, so a single instance can serve concurrent
/// bundle runs behind an `Arc`.
pub struct Pipeline {
    locator: Arc<dyn PackageLocator>,
    walker: TreeWalker,
    resolver: OutputResolver,
    transformer: Transformer,
    options: TransformOptions,
    reporter: Arc<dyn BuildReporter>,
    source_dir: String,
    declaration_files: Vec<String>,
}

impl Pipeline {
    pub fn new(
        locator: Arc<dyn PackageLocator>,
        walker: TreeWalker,
        resolver: OutputResolver,
        transformer: Transformer,
        options: TransformOptions,
    ) -> Self {
        Self {
            locator,
            walker,
            resolver,
            transformer,
            options,
            reporter: Arc::new(TracingReporter),
            source_dir: "src".to_string(),
            declaration_files: vec!["index.d.ts".to_string(), "global.d.ts".to_string()],
        }
    }

    /// Wire the default collaborators from a validated configuration
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        config.validate()?;
        let matcher = PathMatcher::from_config(config)?;
        let layout = DistLayout::from_config(&config.output);
        let resolver = OutputResolver::new(Arc::new(layout), config.declaration_suffix.clone());

        Ok(Self::new(
            Arc::new(WorkspaceLocator::new(config.package_roots.clone())),
            TreeWalker::new(matcher),
            resolver,
            Transformer::default(),
            config.transform.clone(),
        )
        .with_source_dir(config.source_dir.clone())
        .with_declaration_files(config.declaration_files.clone()))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn BuildReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_source_dir(mut self, source_dir: impl Into<String>) -> Self {
        self.source_dir = source_dir.into();
        self
    }

    pub fn with_declaration_files(mut self, files: Vec<String>) -> Self {
        self.declaration_files = files;
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Build one bundle
    pub fn run(&self, bundle: &BundleSpec) -> Result<BundleOutput> {
        let start = Instant::now();
        self.reporter.on_start(bundle);

        match self.run_bundle(bundle, start) {
            Ok(output) => {
                self.reporter.on_success(&output);
                Ok(output)
            }
            Err(e) => {
                self.reporter.on_failure(bundle, &e);
                Err(e)
            }
        }
    }

    fn run_bundle(&self, bundle: &BundleSpec, start: Instant) -> Result<BundleOutput> {
        let package_dir = self.locator.locate(&bundle.entry)?;
        let files = self.discover(&package_dir)?;
        debug!("{}: {} file(s) to process", bundle, files.len());

        let mut mappings = Vec::with_capacity(files.len());
        let mut writers: HashMap<PathBuf, String> = HashMap::new();
        for file in &files {
            let mapping = self.process(file, bundle)?;
            let previous = writers.insert(mapping.output.clone(), mapping.relative_path.clone());
            if let Some(previous) = previous {
                warn!(
                    "{}: {} overwrites {} (written from {})",
                    bundle,
                    mapping.relative_path,
                    mapping.output.display(),
                    previous
                );
            }
            mappings.push(mapping);
        }

        Ok(BundleOutput {
            entry: bundle.entry.clone(),
            format: bundle.format,
            package_dir,
            files: mappings,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Walked sources first, then declaration files present at the package root
    fn discover(&self, package_dir: &Path) -> Result<Vec<SourceFile>> {
        let source_root = join_relative(package_dir, &self.source_dir);
        let mut files = self.walker.walk(&source_root)?;

        for name in &self.declaration_files {
            let path = join_relative(package_dir, name);
            if path.is_file() {
                files.push(SourceFile::new(name.clone(), path));
            } else {
                trace!("No {} in {}", name, package_dir.display());
            }
        }
        Ok(files)
    }

    fn process(&self, file: &SourceFile, bundle: &BundleSpec) -> Result<FileMapping> {
        let output = self.resolver.resolve(file, bundle)?;

        if let Some(dir) = output.parent_dir() {
            fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        }

        match output.kind {
            OutputKind::Verbatim => {
                fs::copy(&file.absolute_path, &output.absolute_path)
                    .map_err(|e| BuildError::io(&file.absolute_path, e))?;
            }
            OutputKind::Transformed => {
                let result = self.transformer.transform(&file.absolute_path, &self.options)?;
                fs::write(&output.absolute_path, result.content)
                    .map_err(|e| BuildError::io(&output.absolute_path, e))?;
            }
        }

        trace!(
            "{} -> {} ({})",
            file.relative_path,
            output.absolute_path.display(),
            output.kind.as_str()
        );
        Ok(FileMapping {
            relative_path: file.relative_path.clone(),
            source: file.absolute_path.clone(),
            output: output.absolute_path,
            kind: output.kind,
        })
    }
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |acc, s| acc.join(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::features::resolution::StaticLocator;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl BuildReporter for RecordingReporter {
        fn on_start(&self, bundle: &BundleSpec) {
            self.events.lock().unwrap().push(format!("start {}", bundle.entry));
        }

        fn on_success(&self, output: &BundleOutput) {
            self.events
                .lock()
                .unwrap()
                .push(format!("success {} {}", output.entry, output.files.len()));
        }

        fn on_failure(&self, bundle: &BundleSpec, error: &BuildError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failure {} {}", bundle.entry, error.kind()));
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn pipeline(package: &Path, out: &Path, reporter: Arc<RecordingReporter>) -> Pipeline {
        let config = BuildConfig::default();
        Pipeline::new(
            Arc::new(StaticLocator::new().with_package("core", package)),
            TreeWalker::new(PathMatcher::from_config(&config).unwrap()),
            OutputResolver::new(Arc::new(DistLayout::new(out)), ".d.ts"),
            Transformer::default(),
            TransformOptions::default(),
        )
        .with_reporter(reporter)
    }

    #[test]
    fn test_run_writes_and_reports() {
        let package = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(&package.path().join("src/main.ts"), "export const a: number = 1;\n");
        write(&package.path().join("global.d.ts"), "declare const G: string;\n");

        let reporter = Arc::new(RecordingReporter::default());
        let output = pipeline(package.path(), out.path(), reporter.clone())
            .run(&BundleSpec::node("core"))
            .unwrap();

        assert_eq!(output.files.len(), 2);
        assert_eq!(output.transformed_count(), 1);
        assert_eq!(output.copied_count(), 1);
        assert_eq!(output.package_dir, package.path());

        let main = out.path().join("core/node/main.js");
        assert_eq!(fs::read_to_string(main).unwrap(), "export const a = 1;\n");
        assert!(out.path().join("core/node/global.d.ts").is_file());

        let events = reporter.events.lock().unwrap();
        assert_eq!(*events, vec!["start core".to_string(), "success core 2".to_string()]);
    }

    #[test]
    fn test_unknown_package_is_not_found() {
        let out = TempDir::new().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let err = pipeline(Path::new("/nonexistent"), out.path(), reporter.clone())
            .run(&BundleSpec::node("other"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            reporter.events.lock().unwrap().last().map(String::as_str),
            Some("failure other not_found")
        );
    }

    #[test]
    fn test_missing_source_root_is_not_found() {
        let package = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let err = pipeline(package.path(), out.path(), Arc::default())
            .run(&BundleSpec::node("core"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_custom_source_dir() {
        let package = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(&package.path().join("lib/x.js"), "module.exports = 1;\n");

        let output = pipeline(package.path(), out.path(), Arc::default())
            .with_source_dir("lib")
            .run(&BundleSpec::node("core"))
            .unwrap();
        assert_eq!(output.files[0].relative_path, "x.js");
        assert!(out.path().join("core/node/x.js").is_file());
    }

    #[test]
    fn test_colliding_outputs_last_writer_wins() {
        let package = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(&package.path().join("src/foo.js"), "export const value = \"js\";\n");
        write(&package.path().join("src/foo.ts"), "export const value: string = \"ts\";\n");

        let output = pipeline(package.path(), out.path(), Arc::default())
            .run(&BundleSpec::node("core"))
            .unwrap();

        let target = out.path().join("core/node/foo.js");
        assert_eq!(output.files.len(), 2);
        assert_eq!(output.duplicate_outputs(), vec![&target]);
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "export const value = \"ts\";\n"
        );
    }

    #[test]
    fn test_join_relative_skips_empty_segments() {
        assert_eq!(
            join_relative(Path::new("/pkg"), "a//b/"),
            PathBuf::from("/pkg/a/b")
        );
    }
}
