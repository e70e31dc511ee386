use std::string::FromUtf8Error;
use std::time::Duration;

use thiserror::Error;

use crate::aws::sigv4::SigningError;

/// Raised while resolving settings, before any remote call is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {key} (checked: {sources})")]
    MissingValue { key: String, sources: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read secrets file {path}: {message}")]
    SecretsFile { path: String, message: String },
}

/// Anything that goes wrong while invoking the remote agent.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Agent request failed: {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to sign request: {0}")]
    Signing(String),

    #[error("Malformed response stream: {0}")]
    MalformedStream(String),

    #[error("Agent reported {kind}: {message}")]
    Remote { kind: String, message: String },

    #[error("Agent response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("Agent response did not complete within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for InvocationError {
    fn from(err: reqwest::Error) -> Self {
        InvocationError::Transport(err.to_string())
    }
}

impl From<SigningError> for InvocationError {
    fn from(err: SigningError) -> Self {
        InvocationError::Signing(err.to_string())
    }
}

/// Listing or fetching stored artifacts failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Key {0} has a `.` or `..` path segment and cannot be addressed")]
    InvalidKey(String),

    #[error("Store request failed: {0}")]
    Transport(String),

    #[error("Store request failed: {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to sign request: {0}")]
    Signing(String),

    #[error("Unexpected listing response: {0}")]
    Listing(String),

    #[error("Artifact {key} is not valid UTF-8")]
    Decode { key: String },

    #[error("Artifact {key} does not match the analysis schema: {message}")]
    Parse { key: String, message: String },
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Transport(err.to_string())
    }
}

impl From<SigningError> for RetrievalError {
    fn from(err: SigningError) -> Self {
        RetrievalError::Signing(err.to_string())
    }
}
