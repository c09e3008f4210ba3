//! Per-file transform step

use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use super::compiler::TypeStripCompiler;
use super::ports::{Compiler, TransformOptions};
use crate::errors::Result;
use crate::shared::models::TransformResult;

/// Runs the configured [`Compiler`] on one file
#[derive(Clone)]
pub struct Transformer {
    compiler: Arc<dyn Compiler>,
}

impl Transformer {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }

    pub fn compiler_name(&self) -> &str {
        self.compiler.name()
    }

    /// Compile `path`; failures carry the path and the compiler diagnostic
    pub fn transform(&self, path: &Path, options: &TransformOptions) -> Result<TransformResult> {
        trace!("{}: transforming {}", self.compiler.name(), path.display());
        let output = self.compiler.transform_file(path, options)?;
        Ok(TransformResult {
            content: output.code,
        })
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(Arc::new(TypeStripCompiler::new()))
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("compiler", &self.compiler.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BuildError, Diagnostic, ErrorKind};
    use crate::features::transform::ports::{CompiledOutput, ModuleFormat};
    use std::sync::Mutex;

    /// Records the options of every call
    #[derive(Default)]
    struct RecordingCompiler {
        seen: Mutex<Vec<TransformOptions>>,
    }

    impl Compiler for RecordingCompiler {
        fn name(&self) -> &str {
            "recording"
        }

        fn transform_file(&self, path: &Path, options: &TransformOptions) -> Result<CompiledOutput> {
            self.seen.lock().unwrap().push(options.clone());
            if path.ends_with("bad.ts") {
                return Err(BuildError::compile(path, Diagnostic::at("boom", 3, 7)));
            }
            Ok(CompiledOutput {
                code: format!("// {}", path.display()),
            })
        }
    }

    #[test]
    fn test_transform_delegates_to_compiler() {
        let compiler = Arc::new(RecordingCompiler::default());
        let transformer = Transformer::new(compiler.clone());
        let options = TransformOptions::default().with_module_format(ModuleFormat::CommonJs);

        let result = transformer.transform(Path::new("/src/a.ts"), &options).unwrap();
        assert_eq!(result.content, "// /src/a.ts");
        transformer.transform(Path::new("/src/b.ts"), &options).unwrap();

        let seen = compiler.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|o| o == &options));
    }

    #[test]
    fn test_compile_failure_keeps_path_and_diagnostic() {
        let transformer = Transformer::new(Arc::new(RecordingCompiler::default()));
        let err = transformer
            .transform(Path::new("/src/bad.ts"), &TransformOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compile);
        assert_eq!(err.path(), Some(Path::new("/src/bad.ts")));
        assert!(err.to_string().contains("3:7: boom"));
    }

    #[test]
    fn test_default_uses_type_strip_compiler() {
        assert_eq!(Transformer::default().compiler_name(), "type-strip");
    }
}
