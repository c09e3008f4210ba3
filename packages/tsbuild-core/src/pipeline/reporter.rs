//! Bundle lifecycle reporting

use tracing::{error, info};

use super::result::BundleOutput;
use crate::errors::BuildError;
use crate::shared::models::BundleSpec;

/// Observer of bundle runs. Purely observational: it cannot alter the outcome.
pub trait BuildReporter: Send + Sync {
    fn on_start(&self, _bundle: &BundleSpec) {}

    fn on_success(&self, _output: &BundleOutput) {}

    fn on_failure(&self, _bundle: &BundleSpec, _error: &BuildError) {}
}

/// Default reporter, logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl BuildReporter for TracingReporter {
    fn on_start(&self, bundle: &BundleSpec) {
        info!("Building {}", bundle);
    }

    fn on_success(&self, output: &BundleOutput) {
        info!(
            "Built {} ({}): {} transformed, {} copied in {}ms",
            output.entry,
            output.format,
            output.transformed_count(),
            output.copied_count(),
            output.duration_ms
        );
    }

    fn on_failure(&self, bundle: &BundleSpec, error: &BuildError) {
        error!("Failed to build {}: {} [{}]", bundle, error, error.kind());
    }
}
