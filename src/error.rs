use std::time::Duration;
use thiserror::Error;

/// Errors produced by the pipeline and its components.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input field was missing or empty. Caught before any
    /// network activity; the run never starts.
    #[error("Missing required input: {field}")]
    Validation {
        /// The form field the user must supply.
        field: &'static str,
    },

    /// The geocoding service returned zero results for the query.
    #[error("No location found for {city}, {state}")]
    NotFound { city: String, state: String },

    /// Non-success HTTP status from a remote service, with the response
    /// body where it could be read.
    #[error("HTTP {status}: {body}")]
    Transport {
        /// HTTP status code (e.g. 404, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The narrative service rejected the supplied API key (HTTP 401).
    #[error("The narrative service rejected the API key")]
    Auth,

    /// The narrative service reported too many requests (HTTP 429).
    #[error("The narrative service is rate limiting requests")]
    RateLimit,

    /// A response decoded as valid JSON but lacked the field the
    /// consumer needs.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The run deadline elapsed before a terminal state was reached.
    #[error("Run timed out after {0:?}")]
    Timeout(Duration),

    /// A run was submitted while another was still in flight.
    #[error("A run is already in progress")]
    Busy,

    /// Low-level HTTP transport failure (connection refused, DNS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
