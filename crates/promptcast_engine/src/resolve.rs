use std::fs;
use std::io;
use std::path::Path;

use engine_logging::{engine_debug, engine_status, engine_warn};
use thiserror::Error;

use crate::backend::SpaceLocator;
use crate::http::{build_client, ensure_success, map_reqwest_error, HttpSettings};
use crate::types::ProbeError;

/// Backends tried after the preferred list, in this order.
pub const FALLBACK_MODELS: &[&str] = &[
    "black-forest-labs/FLUX.1-schnell",
    "stabilityai/stable-diffusion-xl-base-1.0",
    "runwayml/stable-diffusion-v1-5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Preferred,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub identifier: String,
    pub source: CandidateSource,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no backend available ({tried} candidates unreachable, last error: {last_error})")]
    NoBackendAvailable { tried: usize, last_error: String },
}

/// Reads the preferred model list: one identifier per non-blank line.
/// A missing or unreadable file yields an empty list.
pub fn load_model_list(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_debug!("No model list at {:?}; using fallback models only", path);
            Vec::new()
        }
        Err(err) => {
            engine_warn!("Failed to read model list {:?}: {}", path, err);
            Vec::new()
        }
    }
}

/// Preferred identifiers in order, then the fallback list. Duplicates keep
/// their first position.
pub fn candidate_list(preferred: Vec<String>) -> Vec<Candidate> {
    let preferred = preferred.into_iter().map(|identifier| Candidate {
        identifier,
        source: CandidateSource::Preferred,
    });
    let fallback = FALLBACK_MODELS.iter().map(|identifier| Candidate {
        identifier: identifier.to_string(),
        source: CandidateSource::Fallback,
    });

    let mut candidates: Vec<Candidate> = Vec::new();
    for candidate in preferred.chain(fallback) {
        if !candidates
            .iter()
            .any(|seen| seen.identifier == candidate.identifier)
        {
            candidates.push(candidate);
        }
    }
    candidates
}

#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, identifier: &str) -> Result<(), ProbeError>;
}

/// Probes a backend by fetching its `/config` document.
#[derive(Debug, Clone)]
pub struct HttpProber {
    settings: HttpSettings,
    locator: SpaceLocator,
    token: Option<String>,
}

impl HttpProber {
    pub fn new(settings: HttpSettings, locator: SpaceLocator, token: Option<String>) -> Self {
        Self {
            settings,
            locator,
            token,
        }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, identifier: &str) -> Result<(), ProbeError> {
        let base = self.locator.base_url(identifier)?;
        let client = build_client(self.settings.connect_timeout, self.settings.request_timeout)?;

        let mut request = client.get(format!("{base}/config"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

pub struct ModelResolver {
    prober: Box<dyn Prober>,
}

impl ModelResolver {
    pub fn new(prober: Box<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Returns the first candidate that answers its probe. Later candidates
    /// are never probed once one succeeds.
    pub async fn resolve(&self, candidates: &[Candidate]) -> Result<String, ResolveError> {
        let mut last_error = String::from("no candidates configured");
        for candidate in candidates {
            engine_status!("probing", "{}", candidate.identifier);
            match self.prober.probe(&candidate.identifier).await {
                Ok(()) => return Ok(candidate.identifier.clone()),
                Err(err) => {
                    engine_warn!(
                        "Model {} ({:?}) unavailable: {}",
                        candidate.identifier,
                        candidate.source,
                        err
                    );
                    last_error = err.to_string();
                }
            }
        }
        Err(ResolveError::NoBackendAvailable {
            tried: candidates.len(),
            last_error,
        })
    }
}
