/*
 * tsbuild-orchestration
 *
 * Concurrent multi-bundle builds on top of tsbuild-core
 *
 * Architecture:
 * - BuildJob / JobStateMachine: QUEUED → RUNNING → COMPLETED | FAILED
 * - BundleRunner: pluggable per-bundle execution (PipelineRunner by default)
 * - BuildOrchestrator: bounded-concurrency fan-out with per-bundle deadlines
 */

pub mod error;
pub mod job;
pub mod logging;
pub mod orchestrator;
pub mod runner;

pub use error::{ErrorCategory, OrchestratorError, Result};
pub use job::{BuildJob, JobState, JobStateMachine};
pub use logging::init_tracing;
pub use orchestrator::{BuildOrchestrator, BuildSummary, JobReport};
pub use runner::{BundleRunner, PipelineRunner};

use tsbuild_core::BuildConfig;

/// Build every bundle listed in `config`
pub async fn build(config: &BuildConfig) -> Result<BuildSummary> {
    BuildOrchestrator::from_config(config)?
        .run_all(config.bundles.clone())
        .await
}
