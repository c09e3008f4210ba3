//! Error types for tsbuild-core

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;

/// Build error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing package, source root or declaration file
    NotFound,
    /// Transform failure reported by the compiler
    Compile,
    /// Directory creation, read, write or copy failure
    Io,
    /// Invalid configuration
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Compile => "compile",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compiler diagnostic attached to a [`BuildError::Compile`].
///
/// Line and column are 1-based; both are 0 when the compiler could not
/// attribute the failure to a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}:{}: {}", self.line, self.column, self.message)
        }
    }
}

/// Build error type
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Not found: {what} ({})", path.display())]
    NotFound { what: String, path: PathBuf },

    #[error("Compile error in {}: {diagnostic}", path.display())]
    Compile { path: PathBuf, diagnostic: Diagnostic },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    pub fn compile(path: impl Into<PathBuf>, diagnostic: Diagnostic) -> Self {
        Self::Compile {
            path: path.into(),
            diagnostic,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::NotFound { .. } => ErrorKind::NotFound,
            BuildError::Compile { .. } => ErrorKind::Compile,
            BuildError::Io { .. } => ErrorKind::Io,
            BuildError::Config(_) => ErrorKind::Config,
        }
    }

    /// Path of the file or directory the failure is attributed to
    pub fn path(&self) -> Option<&Path> {
        match self {
            BuildError::NotFound { path, .. }
            | BuildError::Compile { path, .. }
            | BuildError::Io { path, .. } => Some(path),
            BuildError::Config(_) => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BuildError>;
