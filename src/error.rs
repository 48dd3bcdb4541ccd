// src/error.rs

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotificationError>;

/// Errors that can occur while talking to the backend or touching local state
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl From<std::io::Error> for NotificationError {
    fn from(e: std::io::Error) -> Self {
        NotificationError::Storage(e.to_string())
    }
}

impl NotificationError {
    /// Backend status code, if the failure was a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            NotificationError::Status { status, .. } => Some(*status),
            NotificationError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
