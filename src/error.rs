// Error types for the echoes client.
// Covers transport failures, API envelope failures, timeouts, and local IO.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoesError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not logged in")]
    Unauthorized,

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("{0}")]
    Other(String),
}

impl EchoesError {
    /// Whether the failure means the session is missing or expired.
    pub fn is_auth(&self) -> bool {
        matches!(self, EchoesError::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, EchoesError>;
