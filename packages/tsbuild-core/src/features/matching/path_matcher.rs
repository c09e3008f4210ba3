//! Include/skip decision for discovered files

use regex::Regex;
use std::path::Path;

use crate::config::{BuildConfig, ConfigResult};

/// Decides whether a discovered file takes part in the build.
///
/// A file is included only when its extension is recognized and its
/// relative path matches none of the exclusion patterns.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    extensions: Vec<String>,
    exclusions: Vec<Regex>,
}

impl PathMatcher {
    pub fn new<I, S>(extensions: I, exclusions: Vec<Regex>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            exclusions,
        }
    }

    pub fn from_config(config: &BuildConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.source_extensions.iter().cloned(),
            config.compiled_exclusions()?,
        ))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn has_source_extension(&self, relative_path: &str) -> bool {
        Path::new(relative_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclusions
            .iter()
            .any(|pattern| pattern.is_match(relative_path))
    }

    pub fn should_include(&self, relative_path: &str) -> bool {
        self.has_source_extension(relative_path) && !self.is_excluded(relative_path)
    }
}
