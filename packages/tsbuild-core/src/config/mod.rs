//! Configuration System
//!
//! Versioned YAML configuration for package builds.
//!
//! # Examples
//!
//! ```rust,ignore
//! use tsbuild_core::config::BuildConfig;
//!
//! // Defaults: src/**/*.{js,ts}, Node 16, ES modules
//! let config = BuildConfig::default();
//!
//! // Complete control via YAML
//! let config = BuildConfig::from_yaml("tsbuild.yaml")?;
//! ```

pub mod build_config;
pub mod error;

// Re-exports
pub use build_config::{BuildConfig, OrchestrationConfig, OutputConfig, SUPPORTED_VERSIONS};
pub use error::{ConfigError, ConfigResult};
