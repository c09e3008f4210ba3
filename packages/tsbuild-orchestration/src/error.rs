use thiserror::Error;
use tsbuild_core::{BuildError, ErrorKind};

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    /// How a failed bundle should be treated
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::Build(e) => match e.kind() {
                ErrorKind::Io => ErrorCategory::Infrastructure,
                ErrorKind::NotFound | ErrorKind::Compile | ErrorKind::Config => {
                    ErrorCategory::Permanent
                }
            },
            OrchestratorError::Timeout(_) => ErrorCategory::Transient,
            OrchestratorError::TaskFailed(_) | OrchestratorError::Other(_) => {
                ErrorCategory::Infrastructure
            }
            OrchestratorError::InvalidStateTransition { .. } | OrchestratorError::Config(_) => {
                ErrorCategory::Permanent
            }
        }
    }
}

/// Error category of a failed bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// May succeed on a later run (e.g., deadline exceeded)
    Transient,
    /// Fails again until the input changes (e.g., compile error, missing package)
    Permanent,
    /// Environment failure (e.g., disk full, worker task lost)
    Infrastructure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
            ErrorCategory::Infrastructure => "infrastructure",
        }
    }
}

impl std::str::FromStr for ErrorCategory {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "transient" => Ok(ErrorCategory::Transient),
            "permanent" => Ok(ErrorCategory::Permanent),
            "infrastructure" => Ok(ErrorCategory::Infrastructure),
            _ => Err(OrchestratorError::Other(anyhow::anyhow!(
                "Invalid error category: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tsbuild_core::Diagnostic;

    #[test]
    fn test_error_category_roundtrip() {
        for category in &[
            ErrorCategory::Transient,
            ErrorCategory::Permanent,
            ErrorCategory::Infrastructure,
        ] {
            let parsed: ErrorCategory = category.as_str().parse().unwrap();
            assert_eq!(*category, parsed);
        }
    }

    #[test]
    fn test_error_category_invalid() {
        assert!("invalid".parse::<ErrorCategory>().is_err());
    }

    #[test]
    fn test_build_errors_are_classified() {
        let compile: OrchestratorError =
            BuildError::compile(PathBuf::from("a.ts"), Diagnostic::new("bad")).into();
        assert_eq!(compile.category(), ErrorCategory::Permanent);

        let io: OrchestratorError = BuildError::io(
            PathBuf::from("out"),
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        )
        .into();
        assert_eq!(io.category(), ErrorCategory::Infrastructure);

        let missing: OrchestratorError =
            BuildError::not_found("package 'x'", PathBuf::from("packages")).into();
        assert_eq!(missing.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn test_runtime_errors_are_classified() {
        assert_eq!(
            OrchestratorError::Timeout("slow".into()).category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            OrchestratorError::TaskFailed("panicked".into()).category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            OrchestratorError::config("bad").category(),
            ErrorCategory::Permanent
        );
    }
}
