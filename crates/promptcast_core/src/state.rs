use std::fmt;
use std::path::PathBuf;

use crate::PublishWindow;

pub type JobOrdinal = usize;

/// Progress of the current job through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    ModelResolved,
    PromptLoaded,
    Generated,
    Persisted,
    Delivered,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ModelResolved => "model resolved",
            Stage::PromptLoaded => "prompt loaded",
            Stage::Generated => "generated",
            Stage::Persisted => "persisted",
            Stage::Delivered => "delivered",
            Stage::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Job-local stage that can fail without ending the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Generate,
    Persist,
    Deliver,
    Commit,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Generate => "generation",
            FailureStage::Persist => "persist",
            FailureStage::Deliver => "delivery",
            FailureStage::Commit => "queue commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub ordinal: JobOrdinal,
    pub prompt: String,
    pub stage: Stage,
    pub artifact: Option<PathBuf>,
    pub failure: Option<JobFailure>,
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    OutsideWindow,
    QueueEmpty,
    Completed,
    LimitReached,
    JobFailed {
        ordinal: JobOrdinal,
        stage: FailureStage,
    },
    NoBackendAvailable {
        reason: String,
    },
    QueueUnreadable {
        reason: String,
    },
}

impl RunEnd {
    /// Fatal endings terminate the process with a failure status.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RunEnd::NoBackendAvailable { .. } | RunEnd::QueueUnreadable { .. }
        )
    }
}

impl fmt::Display for RunEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEnd::OutsideWindow => write!(f, "outside publish window"),
            RunEnd::QueueEmpty => write!(f, "prompt queue is empty"),
            RunEnd::Completed => write!(f, "completed"),
            RunEnd::LimitReached => write!(f, "job limit reached"),
            RunEnd::JobFailed { ordinal, stage } => {
                write!(f, "job {ordinal} failed during {stage}")
            }
            RunEnd::NoBackendAvailable { reason } => {
                write!(f, "no backend available: {reason}")
            }
            RunEnd::QueueUnreadable { reason } => write!(f, "prompt queue unreadable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Process at most the head prompt.
    #[default]
    Single,
    /// Keep processing until the queue drains, a job fails, or `limit` jobs commit.
    Batch { limit: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunPlan {
    /// `None` leaves the schedule gate open.
    pub window: Option<PublishWindow>,
    pub mode: RunMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub model: Option<String>,
    pub jobs: Vec<JobRecord>,
    pub end: Option<RunEnd>,
}

impl RunReport {
    pub fn committed(&self) -> usize {
        committed_in(&self.jobs)
    }
}

fn committed_in(jobs: &[JobRecord]) -> usize {
    jobs.iter()
        .filter(|job| job.stage == Stage::Committed)
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    NotStarted,
    Running,
    Finished,
}

/// State of a single run. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    plan: RunPlan,
    phase: Phase,
    stage: Stage,
    model: Option<String>,
    jobs: Vec<JobRecord>,
    end: Option<RunEnd>,
}

impl RunState {
    pub fn new(plan: RunPlan) -> Self {
        Self {
            plan,
            ..Self::default()
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::NotStarted
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn end(&self) -> Option<&RunEnd> {
        self.end.as_ref()
    }

    /// Ordinal of the job in flight, if any.
    pub fn current_ordinal(&self) -> Option<JobOrdinal> {
        self.current_job().map(|job| job.ordinal)
    }

    pub fn current_job(&self) -> Option<&JobRecord> {
        match self.stage {
            Stage::Idle | Stage::ModelResolved => None,
            _ => self.jobs.last(),
        }
    }

    pub(crate) fn committed_count(&self) -> usize {
        committed_in(&self.jobs)
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            model: self.model.clone(),
            jobs: self.jobs.clone(),
            end: self.end.clone(),
        }
    }

    pub(crate) fn begin(&mut self) {
        self.phase = Phase::Running;
        self.stage = Stage::Idle;
    }

    pub(crate) fn finish(&mut self, end: RunEnd) {
        self.phase = Phase::Finished;
        self.end = Some(end);
    }

    pub(crate) fn set_model(&mut self, model: String) {
        self.model = Some(model);
        self.stage = Stage::ModelResolved;
    }

    pub(crate) fn start_job(&mut self, prompt: String) -> JobOrdinal {
        let ordinal = self.jobs.len() + 1;
        self.jobs.push(JobRecord {
            ordinal,
            prompt,
            stage: Stage::PromptLoaded,
            artifact: None,
            failure: None,
        });
        self.stage = Stage::PromptLoaded;
        ordinal
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        if let Some(job) = self.jobs.last_mut() {
            job.stage = stage;
        }
    }

    pub(crate) fn set_artifact(&mut self, path: PathBuf) {
        if let Some(job) = self.jobs.last_mut() {
            job.artifact = Some(path);
        }
    }

    pub(crate) fn fail_job(&mut self, stage: FailureStage, reason: String) -> Option<JobOrdinal> {
        let job = self.jobs.last_mut()?;
        job.failure = Some(JobFailure { stage, reason });
        Some(job.ordinal)
    }
}
