//! Error types for the orchestration engine

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error talking to a backend model
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid server configuration (e.g. no API keys)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed request envelope; mapped to HTTP 400 before any stream opens
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The key pool has no credentials left to try
    #[error("Key pool exhausted")]
    PoolExhausted,

    /// A single call to a backend model failed
    #[error("API error (status {status}): model {model}")]
    Api {
        status: u16,
        key: String,
        model: String,
    },

    /// No parallel task produced a reply
    #[error("all parallel inference models failed: {0}")]
    AllFailed(String),

    /// The integration call exhausted its retry budget
    #[error("integration failed: {cause}")]
    IntegrationFailed { cause: String },

    /// A step that requires fan-out was asked to run with no enabled models
    #[error("no enabled models available for this step")]
    NoEnabledModels,

    /// The request's client disconnected; in-flight upstream calls were dropped
    #[error("request cancelled")]
    Cancelled,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Error::BadRequest(msg.into())
    }

    pub fn api(status: u16, key: impl Into<String>, model: impl Into<String>) -> Self {
        Error::Api {
            status,
            key: key.into(),
            model: model.into(),
        }
    }

    pub fn all_failed(msg: impl Into<String>) -> Self {
        Error::AllFailed(msg.into())
    }

    pub fn integration_failed(cause: impl Into<String>) -> Self {
        Error::IntegrationFailed {
            cause: cause.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// HTTP status to report when the error occurs before the stream has opened.
    pub fn pre_stream_status(&self) -> Option<u16> {
        match self {
            Error::Config(_) => Some(500),
            Error::BadRequest(_) => Some(400),
            _ => None,
        }
    }
}
