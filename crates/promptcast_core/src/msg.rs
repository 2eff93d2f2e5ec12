use std::fmt;
use std::path::PathBuf;

use crate::FailureStage;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Run requested at the given local hour of day (0..=23).
    Start { local_hour: u32 },
    /// A candidate backend answered its probe.
    ModelResolved { model: String },
    /// Every candidate backend failed its probe.
    ModelUnavailable { reason: String },
    /// Head of the prompt queue, or `None` when the queue is empty.
    PromptPeeked(Option<String>),
    /// The queue store could not be read.
    QueueUnreadable { reason: String },
    /// Backend produced an image for the current job.
    Generated { image: ImageHandle },
    /// Image was written to the artifact directory.
    Persisted { path: PathBuf },
    /// Messaging endpoint accepted the artifact.
    Delivered,
    /// Head prompt was removed from the queue store.
    Committed,
    /// A stage of the current job failed.
    JobFailed { stage: FailureStage, reason: String },
}

/// Reference to an image produced by a backend.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageHandle {
    /// Raw encoded image bytes held in memory.
    Bytes(Vec<u8>),
    /// Encoded image stored in a local file (e.g. a backend temp file).
    File(PathBuf),
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageHandle::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ImageHandle::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}
