use std::path::PathBuf;

use crate::{ImageHandle, JobOrdinal, RunEnd};

/// Work requested by the state machine; executed by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveModel,
    PeekPrompt,
    Generate {
        model: String,
        prompt: String,
    },
    Persist {
        image: ImageHandle,
        prompt: String,
        disambiguator: Disambiguator,
    },
    Deliver {
        path: PathBuf,
        prompt: String,
    },
    CommitRemoval {
        prompt: String,
    },
    Finish(RunEnd),
}

/// How an artifact filename is kept unique across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disambiguator {
    /// Local wall-clock timestamp, used for single-job runs.
    Timestamp,
    /// 1-based position of the job within a batch run.
    Ordinal(JobOrdinal),
}
