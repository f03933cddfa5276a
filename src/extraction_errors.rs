//! # Extraction Error Types Module
//!
//! This module defines the error types returned by the bet slip extraction client.
//! Each variant maps to exactly one user-facing reply in the conversation flow.

/// Failure modes of a single extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Network failure, timeout, open circuit breaker or a non-JSON body
    TransportFailure(String),
    /// The service answered with an explicit error payload (message kept verbatim)
    ServiceError(String),
    /// The service answered without any usable text
    EmptyResponse,
    /// The screenshot could not be decoded, is unsupported or too large
    InvalidImage(String),
    /// No extraction credential is configured
    NotConfigured,
}

impl ExtractionError {
    /// Whether this failure should count against the circuit breaker
    pub fn is_transport(&self) -> bool {
        matches!(self, ExtractionError::TransportFailure(_))
    }
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::TransportFailure(msg) => write!(f, "Transport failure: {msg}"),
            ExtractionError::ServiceError(msg) => write!(f, "Service error: {msg}"),
            ExtractionError::EmptyResponse => write!(f, "Empty response from extraction service"),
            ExtractionError::InvalidImage(msg) => write!(f, "Invalid image: {msg}"),
            ExtractionError::NotConfigured => write!(f, "Extraction service credential not configured"),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        ExtractionError::TransportFailure(err.to_string())
    }
}
