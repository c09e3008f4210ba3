use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tsbuild_core::{BundleOutput, BundleSpec, Pipeline};

/// Bundle runner trait (pluggable execution)
#[async_trait]
pub trait BundleRunner: Send + Sync {
    /// Runner identifier (for logs)
    fn name(&self) -> &str;

    /// Build one bundle
    async fn run(&self, bundle: BundleSpec) -> Result<BundleOutput>;
}

/// Runs a [`Pipeline`] on the blocking thread pool.
///
/// Once started, a bundle runs to completion even if its caller stops
/// waiting for it.
#[derive(Clone)]
pub struct PipelineRunner {
    pipeline: Arc<Pipeline>,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl BundleRunner for PipelineRunner {
    fn name(&self) -> &str {
        "pipeline"
    }

    async fn run(&self, bundle: BundleSpec) -> Result<BundleOutput> {
        let pipeline = self.pipeline.clone();
        let label = bundle.to_string();

        let outcome = tokio::task::spawn_blocking(move || pipeline.run(&bundle))
            .await
            .map_err(|e| OrchestratorError::TaskFailed(format!("{}: {}", label, e)))?;
        Ok(outcome?)
    }
}
