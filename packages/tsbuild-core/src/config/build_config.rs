//! Build configuration (YAML schema v1)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use crate::features::transform::TransformOptions;
use crate::shared::models::BundleSpec;

/// Supported schema versions
pub const SUPPORTED_VERSIONS: &[u64] = &[1];

/// Distribution layout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Root directory all bundles are written under
    pub root: PathBuf,
    /// Format directory for `node` bundles
    pub node_dir: String,
    /// Format directory for every other bundle format
    pub other_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("build"),
            node_dir: "node".to_string(),
            other_dir: "esm".to_string(),
        }
    }
}

/// Multi-bundle execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestrationConfig {
    /// Bundles built at the same time
    pub parallel_bundles: usize,
    /// Deadline for a single bundle, no deadline when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_timeout_ms: Option<u64>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            parallel_bundles: (num_cpus::get() * 3 / 4).max(1), // 75% of cores
            bundle_timeout_ms: None,
        }
    }
}

/// Complete build configuration.
///
/// `Default` reproduces the stock package build: `src/**/*.{js,ts}` compiled
/// for Node 16 as ES modules, test files and fixtures skipped, `index.d.ts`
/// and `global.d.ts` copied next to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Schema version (always 1 for v1)
    pub version: u64,

    /// Source directory inside each package
    pub source_dir: String,

    /// Recognized source extensions, without the dot
    pub source_extensions: Vec<String>,

    /// Exclusion regexes matched against `/`-separated relative paths
    pub exclude: Vec<String>,

    /// Declaration files looked up at the package root
    pub declaration_files: Vec<String>,

    /// Suffix marking a declaration file
    pub declaration_suffix: String,

    /// Directories searched for packages, in order
    pub package_roots: Vec<PathBuf>,

    pub output: OutputConfig,

    pub transform: TransformOptions,

    pub orchestration: OrchestrationConfig,

    /// Bundles built when none are given explicitly
    pub bundles: Vec<BundleSpec>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: 1,
            source_dir: "src".to_string(),
            source_extensions: vec!["js".to_string(), "ts".to_string()],
            exclude: vec![
                r"\.test\.[jt]s$".to_string(),
                r"(^|/)fixtures(/|$)".to_string(),
            ],
            declaration_files: vec!["index.d.ts".to_string(), "global.d.ts".to_string()],
            declaration_suffix: ".d.ts".to_string(),
            package_roots: vec![PathBuf::from("packages")],
            output: OutputConfig::default(),
            transform: TransformOptions::default(),
            orchestration: OrchestrationConfig::default(),
            bundles: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML content
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;

        // Version check before field decoding
        let version = match value.get("version") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| ConfigError::Custom("'version' must be an integer".to_string()))?,
            None => return Err(ConfigError::MissingVersion),
        };
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let config: BuildConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(self).map_err(ConfigError::Yaml)
    }

    /// Range checks and pattern compilation
    pub fn validate(&self) -> ConfigResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        if self.source_dir.trim().is_empty() || Path::new(&self.source_dir).is_absolute() {
            return Err(ConfigError::Custom(format!(
                "source_dir must be a non-empty relative path, got '{}'",
                self.source_dir
            )));
        }

        if self.source_extensions.is_empty() {
            return Err(ConfigError::Custom(
                "source_extensions must list at least one extension".to_string(),
            ));
        }
        if let Some(ext) = self
            .source_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::Custom(format!(
                "source extension '{}' must be non-empty and written without the leading dot",
                ext
            )));
        }

        if self.declaration_suffix.is_empty() {
            return Err(ConfigError::Custom(
                "declaration_suffix must not be empty".to_string(),
            ));
        }

        self.compiled_exclusions()?;

        if self.transform.targets.node == 0 || self.transform.targets.node > 99 {
            return Err(ConfigError::range_with_hint(
                "transform.targets.node",
                self.transform.targets.node,
                1,
                99,
                "Use the Node.js major version, e.g. 16.",
            ));
        }

        if self.orchestration.parallel_bundles == 0 || self.orchestration.parallel_bundles > 1024 {
            return Err(ConfigError::range_with_hint(
                "orchestration.parallel_bundles",
                self.orchestration.parallel_bundles,
                1,
                1024,
                "Use at least one worker.",
            ));
        }

        if self.orchestration.bundle_timeout_ms == Some(0) {
            return Err(ConfigError::range_with_hint(
                "orchestration.bundle_timeout_ms",
                0,
                1,
                u64::MAX,
                "Remove the field to disable the deadline.",
            ));
        }

        Ok(())
    }

    /// Compile the exclusion patterns
    pub fn compiled_exclusions(&self) -> ConfigResult<Vec<Regex>> {
        self.exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::invalid_pattern(pattern.as_str(), &e))
            })
            .collect()
    }

    /// Human-readable one-line summary
    pub fn describe(&self) -> String {
        format!(
            "source={} extensions=[{}] exclude={} module_format={} node>={} output={}",
            self.source_dir,
            self.source_extensions.join(","),
            self.exclude.len(),
            self.transform.module_format,
            self.transform.targets.node,
            self.output.root.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::transform::ModuleFormat;
    use crate::shared::models::BundleFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = BuildConfig::default();
        config.validate().unwrap();
        assert_eq!(config.source_dir, "src");
        assert_eq!(config.declaration_files, vec!["index.d.ts", "global.d.ts"]);
        assert_eq!(config.compiled_exclusions().unwrap().len(), 2);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = BuildConfig::default();
        config.transform.module_format = ModuleFormat::CommonJs;
        config.bundles.push(BundleSpec::node("core"));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("module_format: commonjs"));

        let loaded = BuildConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_yaml_loading_partial_file() {
        let yaml_content = r#"
version: 1
source_dir: lib
exclude:
  - '\.spec\.ts$'
output:
  root: dist
transform:
  module_format: commonjs
  targets:
    node: 18
bundles:
  - entry: core
    format: node
  - entry: web
    format: other
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = BuildConfig::from_yaml(temp_file.path()).unwrap();
        assert_eq!(config.source_dir, "lib");
        assert_eq!(config.exclude, vec![r"\.spec\.ts$"]);
        assert_eq!(config.output.root, PathBuf::from("dist"));
        assert_eq!(config.output.node_dir, "node");
        assert_eq!(config.transform.module_format, ModuleFormat::CommonJs);
        assert_eq!(config.transform.targets.node, 18);
        assert_eq!(config.bundles.len(), 2);
        assert_eq!(config.bundles[1].format, BundleFormat::Other);
        // untouched sections keep their defaults
        assert_eq!(config.source_extensions, vec!["js", "ts"]);
    }

    #[test]
    fn test_missing_version() {
        let err = BuildConfig::from_yaml_str("source_dir: src\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVersion));
    }

    #[test]
    fn test_unsupported_version() {
        let err = BuildConfig::from_yaml_str("version: 2\n").unwrap_err();
        match err {
            ConfigError::UnsupportedVersion { found, supported } => {
                assert_eq!(found, 2);
                assert_eq!(supported, vec![1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BuildConfig::from_yaml_str("version: 1\nsource_folder: src\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_invalid_exclusion_pattern() {
        let err = BuildConfig::from_yaml_str("version: 1\nexclude: ['(fixtures']\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_parallel_bundles_range() {
        let mut config = BuildConfig::default();
        config.orchestration.parallel_bundles = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Range { .. }
        ));
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let mut config = BuildConfig::default();
        config.source_extensions = vec![".ts".to_string()];
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Custom(_)
        ));
    }

    #[test]
    fn test_absolute_source_dir_rejected() {
        let mut config = BuildConfig::default();
        config.source_dir = "/abs/src".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = BuildConfig::default();
        config.orchestration.bundle_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_describe() {
        let description = BuildConfig::default().describe();
        assert!(description.contains("extensions=[js,ts]"));
        assert!(description.contains("module_format=esmodule"));
    }
}
