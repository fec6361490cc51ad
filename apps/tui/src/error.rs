//! Error types for scan retrieval

use thiserror::Error;

/// Message shown for every failure that is not reported by the server itself.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to retrieve data";

/// Why a single polling cycle produced no snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed scan payload: {0}")]
    Decode(String),

    /// The endpoint answered but reported an application-level error.
    #[error("{0}")]
    Server(String),
}

impl FetchError {
    /// Text for the error banner. Server messages pass through untouched.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server(message) => message.clone(),
            Self::Transport(_) | Self::Status(_) | Self::Decode(_) => {
                TRANSPORT_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
