use crate::error::{ErrorCategory, OrchestratorError, Result};
use crate::job::{BuildJob, JobStateMachine};
use crate::runner::{BundleRunner, PipelineRunner};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tsbuild_core::{BuildConfig, BundleOutput, BundleSpec, Pipeline};

/// Final job plus its output when it completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job: BuildJob,
    pub output: Option<BundleOutput>,
}

/// Aggregated outcome of a multi-bundle build (jobs in submission order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSummary {
    pub jobs: Vec<JobReport>,
    pub duration_ms: u64,
}

impl BuildSummary {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|r| r.job.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|r| r.job.is_failed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn files_written(&self) -> usize {
        self.jobs
            .iter()
            .filter_map(|r| r.output.as_ref())
            .map(|o| o.files.len())
            .sum()
    }

    /// Failed jobs with their error message
    pub fn failures(&self) -> impl Iterator<Item = (&BuildJob, &str)> {
        self.jobs
            .iter()
            .filter_map(|r| r.job.error().map(|e| (&r.job, e)))
    }

    pub fn report(&self, entry: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|r| r.job.bundle.entry == entry)
    }

    /// Build manifest for CI artifacts
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OrchestratorError::Other(e.into()))
    }
}

/// Runs bundles concurrently, each through its own [`BundleRunner`] call.
///
/// A failing bundle only fails its own job; the rest keep running.
pub struct BuildOrchestrator {
    runner: Arc<dyn BundleRunner>,
    parallel_bundles: usize,
    bundle_timeout: Option<Duration>,
}

impl BuildOrchestrator {
    pub fn new(runner: Arc<dyn BundleRunner>, parallel_bundles: usize) -> Self {
        Self {
            runner,
            parallel_bundles: parallel_bundles.max(1),
            bundle_timeout: None,
        }
    }

    /// Pipeline runner with the configured concurrency and deadline
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;
        let orchestrator = Self::new(
            Arc::new(PipelineRunner::new(Arc::new(pipeline))),
            config.orchestration.parallel_bundles,
        );

        Ok(match config.orchestration.bundle_timeout_ms {
            Some(ms) => orchestrator.with_timeout(Duration::from_millis(ms)),
            None => orchestrator,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.bundle_timeout = Some(timeout);
        self
    }

    pub fn parallel_bundles(&self) -> usize {
        self.parallel_bundles
    }

    /// Build every bundle, at most `parallel_bundles` at a time
    pub async fn run_all(&self, bundles: Vec<BundleSpec>) -> Result<BuildSummary> {
        let start = Instant::now();
        if bundles.is_empty() {
            warn!("No bundles to build");
        }
        info!(
            "Building {} bundle(s) with runner '{}', {} at a time",
            bundles.len(),
            self.runner.name(),
            self.parallel_bundles
        );

        let mut results: Vec<(usize, Result<JobReport>)> =
            stream::iter(bundles.into_iter().enumerate())
                .map(|(index, bundle)| {
                    let runner = self.runner.clone();
                    let timeout = self.bundle_timeout;
                    async move {
                        let job = BuildJob::new_queued(bundle);
                        (index, execute_job(runner, job, timeout).await)
                    }
                })
                .buffer_unordered(self.parallel_bundles)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        let jobs = results
            .into_iter()
            .map(|(_, report)| report)
            .collect::<Result<Vec<_>>>()?;
        let summary = BuildSummary {
            jobs,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Build finished: {} succeeded, {} failed, {} files in {}ms",
            summary.succeeded(),
            summary.failed(),
            summary.files_written(),
            summary.duration_ms
        );
        Ok(summary)
    }
}

async fn execute_job(
    runner: Arc<dyn BundleRunner>,
    job: BuildJob,
    timeout: Option<Duration>,
) -> Result<JobReport> {
    let bundle = job.bundle.clone();
    let job_id = job.id;

    // Transition: QUEUED → RUNNING
    let mut sm = JobStateMachine::new(job);
    sm.start()?;
    info!("Job {} started: {}", job_id, bundle);

    let run = runner.run(bundle.clone());
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(outcome) => outcome,
            Err(_) => Err(OrchestratorError::Timeout(format!(
                "{} exceeded {}ms",
                bundle,
                limit.as_millis()
            ))),
        },
        None => run.await,
    };

    match outcome {
        Ok(output) => {
            sm.complete(output.files.len())?;
            info!(
                "Job {} completed: {} ({} files)",
                job_id,
                bundle,
                output.files.len()
            );
            Ok(JobReport {
                job: sm.into_job(),
                output: Some(output),
            })
        }
        Err(e) => {
            let category: ErrorCategory = e.category();
            error!("Job {} failed: {} [{}]: {}", job_id, bundle, category, e);
            sm.fail(e.to_string(), category)?;
            Ok(JobReport {
                job: sm.into_job(),
                output: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tsbuild_core::{BuildError, BundleFormat, Diagnostic};

    /// Sleeps per bundle; `bad*` entries fail, `slow*` entries take long
    #[derive(Default)]
    struct MockRunner {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl BundleRunner for MockRunner {
        fn name(&self) -> &str {
            "mock"
        }

        async fn run(&self, bundle: BundleSpec) -> Result<BundleOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = if bundle.entry.starts_with("slow") {
                Duration::from_millis(2_000)
            } else {
                Duration::from_millis(30)
            };
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if bundle.entry.starts_with("bad") {
                return Err(BuildError::compile(
                    PathBuf::from(format!("{}/src/index.ts", bundle.entry)),
                    Diagnostic::at("Unexpected `=`", 1, 14),
                )
                .into());
            }
            Ok(BundleOutput {
                entry: bundle.entry.clone(),
                format: bundle.format,
                package_dir: PathBuf::from(&bundle.entry),
                files: Vec::new(),
                duration_ms: delay.as_millis() as u64,
            })
        }
    }

    fn bundles(entries: &[&str]) -> Vec<BundleSpec> {
        entries.iter().map(|e| BundleSpec::node(*e)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_bundles_complete_within_concurrency_limit() {
        let runner = Arc::new(MockRunner::default());
        let orchestrator = BuildOrchestrator::new(runner.clone(), 2);

        let summary = orchestrator
            .run_all(bundles(&["a", "b", "c", "d", "e", "f"]))
            .await
            .unwrap();

        assert_eq!(summary.succeeded(), 6);
        assert!(summary.is_success());
        assert!(runner.max_in_flight.load(Ordering::SeqCst) <= 2);
        let order: Vec<&str> = summary
            .jobs
            .iter()
            .map(|r| r.job.bundle.entry.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_bundle_does_not_stop_others() {
        let orchestrator = BuildOrchestrator::new(Arc::new(MockRunner::default()), 4);

        let summary = orchestrator
            .run_all(bundles(&["a", "bad", "c"]))
            .await
            .unwrap();

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        let failed = summary.report("bad").unwrap();
        assert!(failed.output.is_none());
        assert_eq!(failed.job.error_category(), Some(ErrorCategory::Permanent));
        let (job, message) = summary.failures().next().unwrap();
        assert_eq!(job.bundle.entry, "bad");
        assert!(message.contains("bad/src/index.ts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_slow_bundle() {
        let orchestrator = BuildOrchestrator::new(Arc::new(MockRunner::default()), 3)
            .with_timeout(Duration::from_millis(300));

        let started = tokio::time::Instant::now();
        let summary = orchestrator
            .run_all(bundles(&["fast", "slow", "other"]))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(2_000));

        assert_eq!(summary.succeeded(), 2);
        let slow = summary.report("slow").unwrap();
        assert!(slow.job.is_failed());
        assert_eq!(slow.job.error_category(), Some(ErrorCategory::Transient));
        assert!(summary.report("fast").unwrap().job.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_bundle_list() {
        let orchestrator = BuildOrchestrator::new(Arc::new(MockRunner::default()), 0);
        assert_eq!(orchestrator.parallel_bundles(), 1);
        let summary = orchestrator.run_all(Vec::new()).await.unwrap();
        assert!(summary.jobs.is_empty());
        assert!(summary.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_manifest_lists_jobs() {
        let orchestrator = BuildOrchestrator::new(Arc::new(MockRunner::default()), 2);
        let summary = orchestrator.run_all(bundles(&["a", "bad"])).await.unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        let jobs = manifest["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0]["job"]["bundle"]["entry"], "a");
        assert!(jobs[1]["output"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_format_is_kept() {
        let orchestrator = BuildOrchestrator::new(Arc::new(MockRunner::default()), 1);
        let summary = orchestrator
            .run_all(vec![BundleSpec::new("web", BundleFormat::Other)])
            .await
            .unwrap();
        let output = summary.jobs[0].output.as_ref().unwrap();
        assert_eq!(output.format, BundleFormat::Other);
    }
}
