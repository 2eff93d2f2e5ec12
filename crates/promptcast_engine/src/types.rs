use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
    Backend,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Backend => write!(f, "backend error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Transport-level failure shared by every HTTP-facing component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl HttpFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A backend did not answer its connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("probe failed ({kind}): {message}")]
pub struct ProbeError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<HttpFailure> for ProbeError {
    fn from(failure: HttpFailure) -> Self {
        Self::new(failure.kind, failure.message)
    }
}

/// Backend invocation failed, timed out, or answered with something unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("generation failed ({kind}): {message}")]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<HttpFailure> for GenerationError {
    fn from(failure: HttpFailure) -> Self {
        Self::new(failure.kind, failure.message)
    }
}

/// The messaging endpoint did not accept the artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery failed ({kind}): {message}")]
pub struct DeliveryError {
    pub kind: FailureKind,
    pub message: String,
}

impl DeliveryError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<HttpFailure> for DeliveryError {
    fn from(failure: HttpFailure) -> Self {
        Self::new(failure.kind, failure.message)
    }
}
