//! Mapping from backend identifiers (`owner/name`) to HTTP base URLs.

use url::Url;

use crate::types::{FailureKind, HttpFailure};

/// Where backend spaces are hosted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpaceLocator {
    /// `https://<slug>.hf.space`
    #[default]
    HuggingFace,
    /// `<base>/<slug>`, for self-hosted mirrors.
    Mirror(Url),
}

impl SpaceLocator {
    pub fn mirror(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base).map(Self::Mirror)
    }

    /// Base URL for `identifier`, without a trailing slash.
    pub(crate) fn base_url(&self, identifier: &str) -> Result<String, HttpFailure> {
        let slug = space_slug(identifier);
        if slug.is_empty() {
            return Err(HttpFailure::new(
                FailureKind::InvalidUrl,
                format!("empty backend identifier {identifier:?}"),
            ));
        }
        let raw = match self {
            SpaceLocator::HuggingFace => format!("https://{slug}.hf.space"),
            SpaceLocator::Mirror(base) => {
                format!("{}/{slug}", base.as_str().trim_end_matches('/'))
            }
        };
        let parsed = Url::parse(&raw)
            .map_err(|err| HttpFailure::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }
}

/// `black-forest-labs/FLUX.1-schnell` -> `black-forest-labs-flux-1-schnell`
pub fn space_slug(identifier: &str) -> String {
    identifier
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | '.' | '_' => '-',
            other => other,
        })
        .collect()
}
