//! Inference client errors.

use thiserror::Error;

/// Errors from one exchange with the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The configured endpoint is unusable.
    #[error("invalid inference endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport failed (DNS, connection refused, timeout, ...).
    #[error("inference request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a body that breaks the contract.
    #[error("invalid inference response: {0}")]
    Protocol(String),

    /// The service answered with a non-success status.
    #[error("inference service returned {status}: {detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The service's `detail` message, or the raw body.
        detail: String,
    },
}

impl InferenceError {
    /// Message shown to the user in the failure alert.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) | Self::Network(_) => "Could not reach the backend.",
            Self::Protocol(_) => "The backend returned an invalid response.",
            Self::Rejected { .. } => "The backend rejected the drawing.",
        }
    }
}
