//! Promptcast engine: IO components and the effect-executing orchestrator.
mod artifact;
mod backend;
mod delivery;
mod filename;
mod http;
mod invoke;
mod lock;
mod orchestrator;
mod params;
mod persist;
mod queue;
mod resolve;
mod types;

pub use artifact::{
    local_timestamp, normalize_to_png, ArtifactStore, PngArtifactStore, TimestampFn,
};
pub use backend::{space_slug, SpaceLocator};
pub use delivery::{
    truncate_caption, CaptionStyle, DeliveryChannel, TelegramChannel, TelegramSettings,
    MAX_CAPTION_CHARS, TELEGRAM_API_URL,
};
pub use filename::{artifact_filename, sanitize_prompt_prefix, DEFAULT_PREFIX_LEN};
pub use http::HttpSettings;
pub use invoke::{first_image_reference, parse_event_stream, GenerationInvoker, GradioInvoker};
pub use lock::{LockError, RunLock};
pub use orchestrator::{Components, Orchestrator};
pub use params::{classify, GenerationParams, GenerationRequest, ParameterProfile};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use queue::{PromptQueue, QueueError};
pub use resolve::{
    candidate_list, load_model_list, Candidate, CandidateSource, HttpProber, ModelResolver,
    Prober, ResolveError, FALLBACK_MODELS,
};
pub use types::{DeliveryError, FailureKind, GenerationError, ProbeError};
