use crate::error::{ErrorCategory, OrchestratorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsbuild_core::BundleSpec;
use uuid::Uuid;

/// Bundle job state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobState {
    Queued {
        queued_at: DateTime<Utc>,
    },
    Running {
        started_at: DateTime<Utc>,
    },
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        files_written: usize,
    },
    Failed {
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        error: String,
        error_category: ErrorCategory,
    },
}

impl JobState {
    pub fn state_name(&self) -> &'static str {
        match self {
            JobState::Queued { .. } => "queued",
            JobState::Running { .. } => "running",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }
}

/// One bundle build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJob {
    pub id: Uuid,
    pub bundle: BundleSpec,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BuildJob {
    /// Create a new queued job
    pub fn new_queued(bundle: BundleSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bundle,
            state: JobState::Queued { queued_at: now },
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, JobState::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, JobState::Failed { .. })
    }

    /// Error message of a failed job
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn error_category(&self) -> Option<ErrorCategory> {
        match &self.state {
            JobState::Failed { error_category, .. } => Some(*error_category),
            _ => None,
        }
    }
}

/// Job state machine for transitions
pub struct JobStateMachine {
    job: BuildJob,
}

impl JobStateMachine {
    pub fn new(job: BuildJob) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &BuildJob {
        &self.job
    }

    pub fn into_job(self) -> BuildJob {
        self.job
    }

    fn invalid(&self, to: &str) -> OrchestratorError {
        OrchestratorError::InvalidStateTransition {
            from: self.job.state.state_name().to_string(),
            to: to.to_string(),
        }
    }

    /// Transition: QUEUED → RUNNING
    pub fn start(&mut self) -> Result<()> {
        match &self.job.state {
            JobState::Queued { .. } => {
                let now = Utc::now();
                self.job.state = JobState::Running { started_at: now };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("running")),
        }
    }

    /// Transition: RUNNING → COMPLETED
    pub fn complete(&mut self, files_written: usize) -> Result<()> {
        match &self.job.state {
            JobState::Running { started_at } => {
                let now = Utc::now();
                let duration_ms = (now - *started_at).num_milliseconds().max(0) as u64;

                self.job.state = JobState::Completed {
                    started_at: *started_at,
                    completed_at: now,
                    duration_ms,
                    files_written,
                };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("completed")),
        }
    }

    /// Transition: RUNNING → FAILED
    pub fn fail(&mut self, error: String, error_category: ErrorCategory) -> Result<()> {
        match &self.job.state {
            JobState::Running { started_at } => {
                let now = Utc::now();
                self.job.state = JobState::Failed {
                    started_at: *started_at,
                    failed_at: now,
                    error,
                    error_category,
                };
                self.job.updated_at = now;
                Ok(())
            }
            _ => Err(self.invalid("failed")),
        }
    }
}
