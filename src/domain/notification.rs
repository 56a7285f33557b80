use crate::domain::registration::Registration;
use thiserror::Error;

/// Why a single send to the push gateway did not succeed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// No readable response came back (transport failure, unreadable body, no credentials).
    #[error("Network error")]
    NetworkError,
    /// The gateway rejected the request with a body that is not an error envelope.
    #[error("Response parsing error")]
    ResponseParsingError,
    /// The gateway reports the registration token as permanently invalid.
    #[error("Invalid registration id")]
    InvalidRegistrationIdError,
    #[error("Unknown error")]
    UnknownError,
}

impl PublishError {
    /// Short label for metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NetworkError => "network",
            Self::ResponseParsingError => "response_parsing",
            Self::InvalidRegistrationIdError => "invalid_registration_id",
            Self::UnknownError => "unknown",
        }
    }
}

/// Result of one dispatch attempt within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub registration: Registration,
    pub error: Option<PublishError>,
}

impl PublishOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

