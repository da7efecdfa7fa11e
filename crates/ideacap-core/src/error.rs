//! Error types for ideacap.

use thiserror::Error;

/// Result type alias using ideacap's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ideacap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Network/connection level failure, not further interpreted
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response envelope could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Completion endpoint rejected the request
    #[error("Remote error [{status}]: {body}")]
    Remote { status: u16, body: String },

    /// Remote store rejected an image or record upload
    #[error("Upload failed [{status}]: {body}")]
    UploadFailed { status: u16, body: String },

    /// Remote store rejected a collection fetch
    #[error("Fetch failed [{status}]: {body}")]
    FetchFailed { status: u16, body: String },

    /// Remote store rejected a delete
    #[error("Delete failed [{status}]: {body}")]
    DeleteFailed { status: u16, body: String },

    /// Well-formed response without usable content
    #[error("Empty response from completion endpoint")]
    EmptyResponse,

    /// Remote store URL or key is missing
    #[error("Remote store is not configured (set IDEACAP_REMOTE_URL and IDEACAP_REMOTE_KEY)")]
    NotConfigured,

    /// Image compression produced no output
    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),

    /// Attempt to save an idea without recognized text
    #[error("Content cannot be empty")]
    EmptyContent,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status carried by a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. }
            | Error::UploadFailed { status, .. }
            | Error::FetchFailed { status, .. }
            | Error::DeleteFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
